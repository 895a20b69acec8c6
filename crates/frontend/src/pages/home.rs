use shared_types::UpdateUserRequest;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::components::local_input;
use crate::router::Route;
use crate::session::{use_session, Session, SessionState};

#[function_component(Home)]
pub fn home() -> Html {
    let Some(session) = use_session() else {
        return html! {};
    };
    let state = session.state();

    if !state.is_logged_in() {
        return html! {
            <div class="container">
                <h2>{ "Taskfyer" }</h2>
                <p>{ "Please login or register to view your tasks." }</p>
                <Link<Route> to={Route::Login}>
                    <button class="btn btn-primary">{ "Login / Register" }</button>
                </Link<Route>>
            </div>
        };
    }

    html! {
        <div class="container">
            <Profile session={session.clone()} state={state.clone()} />
            { if state.is_verified() {
                html! { <ChangePassword session={session.clone()} loading={state.loading} /> }
            } else {
                html! { <VerifyPrompt session={session.clone()} loading={state.loading} /> }
            } }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ProfileProps {
    session: Session,
    state: SessionState,
}

#[function_component(Profile)]
fn profile(props: &ProfileProps) -> Html {
    let user = &props.state.user;
    let name = use_state(|| user.name.clone().unwrap_or_default());
    let bio = use_state(|| user.bio.clone().unwrap_or_default());
    let photo = use_state(|| user.photo.clone().unwrap_or_default());

    let onsubmit = {
        let session = props.session.clone();
        let (name, bio, photo) = (name.clone(), bio.clone(), photo.clone());
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let changes = UpdateUserRequest {
                name: Some((*name).clone()),
                photo: Some((*photo).clone()),
                bio: Some((*bio).clone()),
            };
            let session = session.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let _ = session.update_user(changes).await;
            });
        })
    };

    let role = user.role.map(|r| r.to_string()).unwrap_or_default();

    html! {
        <section class="profile">
            <h2>{ user.name.clone().unwrap_or_default() }</h2>
            <p>{ user.email.clone().unwrap_or_default() }</p>
            <p>
                <span class="badge">{ role }</span>
                { if props.state.is_verified() {
                    html! { <span class="badge badge-success">{ "Verified" }</span> }
                } else {
                    html! { <span class="badge badge-warning">{ "Not verified" }</span> }
                } }
            </p>
            <form {onsubmit}>
                <input type="text" placeholder="Name" value={(*name).clone()} oninput={local_input(&name)} />
                <input type="text" placeholder="Photo URL" value={(*photo).clone()} oninput={local_input(&photo)} />
                <textarea
                    placeholder="Bio"
                    value={(*bio).clone()}
                    oninput={local_input(&bio)}
                />
                <button class="btn btn-primary" type="submit" disabled={props.state.loading}>
                    { "Update profile" }
                </button>
            </form>
        </section>
    }
}

#[derive(Properties, PartialEq)]
struct VerifyPromptProps {
    session: Session,
    loading: bool,
}

#[function_component(VerifyPrompt)]
fn verify_prompt(props: &VerifyPromptProps) -> Html {
    let onclick = {
        let session = props.session.clone();
        Callback::from(move |_: MouseEvent| {
            let session = session.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let _ = session.email_verification().await;
            });
        })
    };

    html! {
        <section class="verify">
            <p>{ "Verify your email address to change your password." }</p>
            <button class="btn" {onclick} disabled={props.loading}>{ "Send verification email" }</button>
        </section>
    }
}

#[derive(Properties, PartialEq)]
struct ChangePasswordProps {
    session: Session,
    loading: bool,
}

#[function_component(ChangePassword)]
fn change_password(props: &ChangePasswordProps) -> Html {
    let current = use_state(String::new);
    let new = use_state(String::new);

    let onsubmit = {
        let session = props.session.clone();
        let (current, new) = (current.clone(), new.clone());
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let session = session.clone();
            let (current, new) = (current.clone(), new.clone());
            wasm_bindgen_futures::spawn_local(async move {
                if session.change_password(&current, &new).await.is_ok() {
                    current.set(String::new());
                    new.set(String::new());
                }
            });
        })
    };

    html! {
        <section class="change-password">
            <h3>{ "Change password" }</h3>
            <form {onsubmit}>
                <input
                    type="password"
                    placeholder="Current password"
                    value={(*current).clone()}
                    oninput={local_input(&current)}
                />
                <input
                    type="password"
                    placeholder="New password"
                    value={(*new).clone()}
                    oninput={local_input(&new)}
                />
                <button class="btn btn-primary" type="submit" disabled={props.loading}>
                    { "Change password" }
                </button>
            </form>
        </section>
    }
}
