//! Cross-module test suite for the wristmap binary.

mod codec_tests;
