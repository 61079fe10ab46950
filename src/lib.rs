//! A quiz frame: a small widget embedded in a social client.
//!
//! [`quiz`] holds the questions and the quiz state machine, [`frame`] the
//! lifecycle handshake with whatever client hosts the frame, and [`telegram`]
//! a host backed by Telegram chats.

pub mod config;
pub mod frame;
pub mod quiz;
pub mod telegram;
