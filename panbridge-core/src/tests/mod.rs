mod connectivity_tests;
mod fake;
