// src/handlers/mod.rs

pub mod admin;
pub mod answer;
pub mod auth;
pub mod comment;
pub mod doubt;
pub mod junior_space;
pub mod mentor_profile;
pub mod upvote;
pub mod user;
