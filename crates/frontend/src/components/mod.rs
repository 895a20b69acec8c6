pub mod header;
pub mod toasts;

use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::session::{FormField, Session};

/// `oninput` handler writing into the session's form.
pub fn session_input(session: &Session, field: FormField) -> Callback<InputEvent> {
    let session = session.clone();
    Callback::from(move |e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        session.handle_input(field, input.value());
    })
}

/// `oninput` handler writing into a component-local string.
pub fn local_input(value: &UseStateHandle<String>) -> Callback<InputEvent> {
    let value = value.clone();
    Callback::from(move |e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        value.set(input.value());
    })
}
