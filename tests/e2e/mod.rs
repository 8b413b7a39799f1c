// End-to-end tests for the TinyTTS Backend API
//
// Each test boots the full router on an ephemeral port with:
// - an in-memory history repository
// - a fake speech backend that returns canned MP3 frames
// - a temporary data directory for audio files
//
// The Postgres repository test needs Docker and is ignored by default:
//   cargo test --test e2e_tests -- --ignored

mod helpers;
mod test_conversion;
mod test_health;
mod test_history;
mod test_pg_history;
