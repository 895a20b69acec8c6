use yew::prelude::*;

use crate::components::local_input;
use crate::session::use_session;

#[function_component(ForgotPassword)]
pub fn forgot_password() -> Html {
    let email = use_state(String::new);
    let Some(session) = use_session() else {
        return html! {};
    };

    let onsubmit = {
        let session = session.clone();
        let email = email.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let session = session.clone();
            let email = email.clone();
            wasm_bindgen_futures::spawn_local(async move {
                if session.forgot_password_email(&email).await.is_ok() {
                    email.set(String::new());
                }
            });
        })
    };

    html! {
        <div class="container">
            <h2>{ "Forgot your password?" }</h2>
            <p>{ "Enter your email and we will send you a link to reset it." }</p>
            <form {onsubmit}>
                <input
                    type="email"
                    placeholder="Email"
                    value={(*email).clone()}
                    oninput={local_input(&email)}
                />
                <button class="btn btn-primary" type="submit" disabled={session.state().loading}>
                    { "Send reset email" }
                </button>
            </form>
        </div>
    }
}
