//! Integration tests: the orchestrator and engines driven end to end
//! against a scripted in-memory game API.

mod mock_api;
