pub use seedrun_test_utils::init_tracing;
