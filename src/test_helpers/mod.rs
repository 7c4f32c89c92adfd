// Test Helpers Module - In-process Test Doubles
//
// Collaborators for exercising the tracker without a vendor, an event bus or
// a host: every double records what it was asked to do so tests can assert on
// call counts and emitted results.

pub mod harness;
pub mod manual_scheduler;
pub mod mock_event_bus;
pub mod mock_vendor;
pub mod recording_host;
pub mod test_utils;

pub use harness::TrackerHarness;
pub use manual_scheduler::{ArmedAction, ManualScheduler};
pub use mock_event_bus::MockEventBus;
pub use mock_vendor::ScriptedVendorClient;
pub use recording_host::RecordingHost;
pub use test_utils::{get_test_database_url, setup_test_environment, test_config};
