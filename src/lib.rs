#![allow(dead_code)]

pub mod config;
pub mod directory;
pub mod leaderboard;
pub mod output;
pub mod provider;
pub mod provisioner;
pub mod sql;
pub mod state;
