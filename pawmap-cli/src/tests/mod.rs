//! Shared test harness modules for the PawMap CLI.

use super::*;

mod helpers;
