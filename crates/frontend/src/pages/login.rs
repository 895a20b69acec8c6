use yew::prelude::*;
use yew_router::prelude::*;

use crate::components::session_input;
use crate::router::Route;
use crate::session::{use_session, FormField};

#[function_component(Login)]
pub fn login() -> Html {
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
                let _ = session.login_user().await;
            });
        })
    };

    html! {
        <div class="container">
            <h2>{ "Login to your account" }</h2>
            <form {onsubmit}>
                <input
                    type="email"
                    placeholder="Email"
                    value={state.form.email.clone()}
                    oninput={session_input(&session, FormField::Email)}
                />
                <input
                    type="password"
                    placeholder="Password"
                    value={state.form.password.clone()}
                    oninput={session_input(&session, FormField::Password)}
                />
                <button class="btn btn-primary" type="submit" disabled={state.loading}>
                    { "Login" }
                </button>
            </form>
            <p>
                <Link<Route> to={Route::ForgotPassword}>{ "Forgot password?" }</Link<Route>>
            </p>
            <p>
                { "Don't have an account? " }
                <Link<Route> to={Route::Register}>{ "Register here" }</Link<Route>>
            </p>
        </div>
    }
}
