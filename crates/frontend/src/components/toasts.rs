use gloo::timers::callback::Timeout;
use yew::prelude::*;

use crate::session::{use_session, ToastKind};

const TOAST_MILLIS: u32 = 4_000;

/// Shows the latest toast and clears it after a few seconds.
#[function_component(Toasts)]
pub fn toasts() -> Html {
    let session = use_session();
    let toast = session.as_ref().and_then(|s| s.state().toast);

    {
        let session = session.clone();
        use_effect_with(toast.clone(), move |toast| {
            let timeout = match (toast, session) {
                (Some(_), Some(session)) => Some(Timeout::new(TOAST_MILLIS, move || {
                    session.dismiss_toast()
                })),
                _ => None,
            };
            move || drop(timeout)
        });
    }

    let Some(toast) = toast else {
        return html! {};
    };
    let class = match toast.kind {
        ToastKind::Success => "toast toast-success",
        ToastKind::Error => "toast toast-error",
    };

    html! {
        <div {class} role="status">{ toast.message }</div>
    }
}
