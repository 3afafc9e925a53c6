//! End-to-end tests driving the release-tool binary against temporary git repositories

mod helpers;
mod test_release;
mod test_version;
