use yew::prelude::*;
use yew_router::prelude::*;

use crate::router::Route;
use crate::session::use_session;

#[function_component(Header)]
pub fn header() -> Html {
    let session = use_session();
    let Some(session) = session else {
        return html! {};
    };
    let state = session.state();

    let greeting = match (&state.user.name, state.is_logged_in()) {
        (Some(name), true) => format!("Welcome, {}!", name),
        _ => "Welcome to Taskfyer".to_string(),
    };

    let on_logout = {
        let session = session.clone();
        Callback::from(move |_: MouseEvent| {
            let session = session.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let _ = session.logout_user().await;
            });
        })
    };

    html! {
        <header class="header">
            <div>
                <h1>{ greeting }</h1>
                <p>
                    { if state.is_logged_in() {
                        "Manage your account below"
                    } else {
                        "Please login or register to view your tasks"
                    } }
                </p>
            </div>
            <nav>
                <Link<Route> to={Route::Home}>{ "Home" }</Link<Route>>
                { if state.is_creator_or_admin() {
                    html! {
                        <>
                            { " | " }
                            <Link<Route> to={Route::Admin}>{ "Users" }</Link<Route>>
                        </>
                    }
                } else {
                    html! {}
                } }
                { " | " }
                { if state.is_logged_in() {
                    html! { <button class="btn" onclick={on_logout}>{ "Logout" }</button> }
                } else {
                    html! { <Link<Route> to={Route::Login}>{ "Login / Register" }</Link<Route>> }
                } }
            </nav>
        </header>
    }
}
