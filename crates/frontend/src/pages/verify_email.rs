use yew::prelude::*;

use crate::session::use_session;

#[derive(Properties, PartialEq)]
pub struct VerifyEmailProps {
    pub token: String,
}

/// Landing page for the emailed verification link.
#[function_component(VerifyEmail)]
pub fn verify_email(props: &VerifyEmailProps) -> Html {
    let session = use_session();

    {
        let session = session.clone();
        use_effect_with(props.token.clone(), move |token| {
            if let Some(session) = session {
                let token = token.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let _ = session.verify_user(&token).await;
                });
            }
            || ()
        });
    }

    html! {
        <div class="container">
            <h2>{ "Verifying your email..." }</h2>
        </div>
    }
}
