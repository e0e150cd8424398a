//! Server-side HTML pages
//!
//! Every page goes through [layout], which displays the flash message.
//! Text spliced with `(…)` is escaped by maud, only the rendered markdown
//! is inserted as [PreEscaped].

use axum::http::StatusCode;
use maud::DOCTYPE;
use maud::Markup;
use maud::PreEscaped;
use maud::html;

use crate::models::Document;

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }
.flash { background: #fff3cd; border: 1px solid #ffe08a; padding: 0.5rem 1rem; }
.documents li { margin: 0.25rem 0; }
.documents form, .session form { display: inline; }
textarea { width: 100%; font-family: monospace; }
"#;

/// Absolute link to a document, with an optional action suffix (`/edit`, `/delete`)
fn href(name: &str, action: &str) -> String {
    format!("/{}{action}", urlencoding::encode(name))
}

fn layout(title: &str, flash: Option<&str>, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                @if let Some(message) = flash {
                    p class="flash" { (message) }
                }
                (body)
            }
        }
    }
    .into_string()
}

pub fn index(documents: &[Document], login: Option<&str>, flash: Option<&str>) -> String {
    let body = html! {
        ul class="documents" {
            @for document in documents {
                li {
                    a href=(href(&document.name, "")) { (document.name) }
                    " "
                    a href=(href(&document.name, "/edit")) { "Edit" }
                    " "
                    form method="post" action=(href(&document.name, "/delete")) {
                        button type="submit" { "Delete" }
                    }
                }
            }
        }
        p { a href="/new" { "New Document" } }
        @match login {
            Some(login) => {
                form class="session" method="post" action="/users/logout" {
                    p { "Signed in as " (login) "." }
                    button type="submit" { "Sign Out" }
                }
            }
            None => {
                p class="session" { a href="/users/login" { "Sign In" } }
            }
        }
    };
    layout("Documents", flash, body)
}

pub fn document(name: &str, html: &str, flash: Option<&str>) -> String {
    let body = html! {
        article { (PreEscaped(html)) }
        p { a href="/" { "Back" } }
    };
    layout(name, flash, body)
}

pub fn new_document(filename: &str, flash: Option<&str>) -> String {
    let body = html! {
        form method="post" action="/new" {
            label for="filename" { "Add a new document:" }
            input id="filename" name="filename" type="text" value=(filename);
            button type="submit" { "Create" }
        }
    };
    layout("New Document", flash, body)
}

pub fn edit_document(name: &str, content: &str, flash: Option<&str>) -> String {
    let body = html! {
        form method="post" action=(href(name, "")) {
            label for="content" { "Edit content of " (name) ":" }
            textarea id="content" name="content" rows="20" { (content) }
            button type="submit" { "Save Changes" }
        }
    };
    layout(&format!("Edit {name}"), flash, body)
}

pub fn login(username: &str, flash: Option<&str>) -> String {
    let body = html! {
        form method="post" action="/users/login" {
            div {
                label for="username" { "Username" }
                input id="username" name="username" type="text" value=(username);
            }
            div {
                label for="password" { "Password" }
                input id="password" name="password" type="password";
            }
            button type="submit" { "Sign In" }
        }
    };
    layout("Sign In", flash, body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = html! {
        h1 { (status.to_string()) }
        p { (message) }
        p { a href="/" { "Back" } }
    };
    layout(status.canonical_reason().unwrap_or("Error"), None, body)
}
