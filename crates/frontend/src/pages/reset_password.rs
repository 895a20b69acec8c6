use yew::prelude::*;

use crate::components::local_input;
use crate::session::use_session;

#[derive(Properties, PartialEq)]
pub struct ResetPasswordProps {
    pub token: String,
}

#[function_component(ResetPassword)]
pub fn reset_password(props: &ResetPasswordProps) -> Html {
    let password = use_state(String::new);
    let confirm = use_state(String::new);
    let mismatch = use_state(|| false);
    let Some(session) = use_session() else {
        return html! {};
    };

    let onsubmit = {
        let session = session.clone();
        let token = props.token.clone();
        let password = password.clone();
        let confirm = confirm.clone();
        let mismatch = mismatch.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if *password != *confirm {
                mismatch.set(true);
                return;
            }
            mismatch.set(false);

            let session = session.clone();
            let token = token.clone();
            let password = (*password).clone();
            wasm_bindgen_futures::spawn_local(async move {
                let _ = session.reset_password(&token, &password).await;
            });
        })
    };

    html! {
        <div class="container">
            <h2>{ "Reset your password" }</h2>
            <form {onsubmit}>
                <input
                    type="password"
                    placeholder="New password"
                    value={(*password).clone()}
                    oninput={local_input(&password)}
                />
                <input
                    type="password"
                    placeholder="Confirm new password"
                    value={(*confirm).clone()}
                    oninput={local_input(&confirm)}
                />
                { if *mismatch {
                    html! { <p class="error">{ "Passwords do not match" }</p> }
                } else {
                    html! {}
                } }
                <button class="btn btn-primary" type="submit" disabled={session.state().loading}>
                    { "Reset password" }
                </button>
            </form>
        </div>
    }
}
