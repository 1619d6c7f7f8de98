//! OAuth Session Manager tests with mock provider and backend

mod refresh;
