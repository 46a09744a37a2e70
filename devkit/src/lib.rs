/*!
# CCU DevKit - Stubs et utilitaires de test

Bibliothèque facilitant le test du moniteur CCU sans réseau ni attente réelle:
- Fetcher simulé avec réponses scriptées et journal des appels
- Payloads JSON conformes à l'API games
- Harness exécutant des sessions complètes sur une horloge manuelle
*/

pub mod fetcher_stub;
pub mod test_utils;

pub use fetcher_stub::{ApiPayloadBuilder, FetchCall, MockFetcher};
pub use test_utils::TestHarness;
