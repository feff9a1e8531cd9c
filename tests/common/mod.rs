#![allow(dead_code, unused_imports)]

pub use workerwatch_test_utils::builders;
pub use workerwatch_test_utils::fake_restarter::FakeRestarter;
pub use workerwatch_test_utils::fake_session::{FakeSessionFactory, FakeSessionHandle};
pub use workerwatch_test_utils::{init_tracing, wait_until, with_timeout};
