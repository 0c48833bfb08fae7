//! # hb-ui
//!
//! Askama page templates. Every `{{ }}` expression is HTML-escaped, so user
//! text can be passed straight through.

use askama::Template;
use hb_core::models::{House, Thread, ThreadDetail};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub houses: &'a [House],
}

#[derive(Template)]
#[template(path = "new_house.html")]
pub struct NewHouseTemplate;

#[derive(Template)]
#[template(path = "house.html")]
pub struct HouseTemplate<'a> {
    pub house: &'a House,
    pub threads: &'a [Thread],
}

#[derive(Template)]
#[template(path = "new_thread.html")]
pub struct NewThreadTemplate<'a> {
    pub house: &'a House,
}

/// Thread page, including the reply form for the opening post.
#[derive(Template)]
#[template(path = "thread.html")]
pub struct ThreadTemplate<'a> {
    pub detail: &'a ThreadDetail,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub status: u16,
    pub message: &'a str,
}
