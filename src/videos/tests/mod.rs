// src/videos/tests/mod.rs

mod tag_tests;
mod validators_tests;
