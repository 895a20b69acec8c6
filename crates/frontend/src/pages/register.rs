use yew::prelude::*;
use yew_router::prelude::*;

use crate::components::session_input;
use crate::router::Route;
use crate::session::{use_session, FormField};

#[function_component(Register)]
pub fn register() -> Html {
    let Some(session) = use_session() else {
        return html! {};
    };
    let state = session.state();

    let onsubmit = {
        let session = session.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let session = session.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let _ = session.register_user().await;
            });
        })
    };

    html! {
        <div class="container">
            <h2>{ "Register for an account" }</h2>
            <form {onsubmit}>
                <input
                    type="text"
                    placeholder="Full name"
                    value={state.form.name.clone()}
                    oninput={session_input(&session, FormField::Name)}
                />
                <input
                    type="email"
                    placeholder="Email"
                    value={state.form.email.clone()}
                    oninput={session_input(&session, FormField::Email)}
                />
                <input
                    type="password"
                    placeholder="Password (min 6 characters)"
                    value={state.form.password.clone()}
                    oninput={session_input(&session, FormField::Password)}
                />
                <button class="btn btn-primary" type="submit" disabled={state.loading}>
                    { "Register" }
                </button>
            </form>
            <p>
                { "Already have an account? " }
                <Link<Route> to={Route::Login}>{ "Login here" }</Link<Route>>
            </p>
        </div>
    }
}
