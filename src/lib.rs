//! Outreach: six-part sales outreach sequences for spatial biology platforms.
//!
//! A request is either a pasted sequence or lead intel plus a research brief.
//! Model calls draft and rewrite the text; everything around them is a chain
//! of pure passes that parse, normalize, link, schedule and attach assets.
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod logging;
pub mod providers;

pub mod assets;
pub mod sequence;

pub mod pipeline;
pub mod research;
