use yew::prelude::*;

use crate::session::use_session;

/// User list for creators and admins; only admins get delete buttons.
#[function_component(Admin)]
pub fn admin() -> Html {
    let session = use_session();
    let can_view = session
        .as_ref()
        .map(|s| s.state().is_creator_or_admin())
        .unwrap_or(false);

    // Admins are loaded by the provider; creators load the list here.
    {
        let session = session.clone();
        use_effect_with(can_view, move |can_view| {
            if let Some(session) = session.filter(|s| *can_view && !s.state().is_admin()) {
                wasm_bindgen_futures::spawn_local(async move {
                    let _ = session.get_all_users().await;
                });
            }
            || ()
        });
    }

    let Some(session) = session else {
        return html! {};
    };
    let state = session.state();

    if !can_view {
        return html! {
            <div class="container">
                <p>{ "Only creators and admins can view users." }</p>
            </div>
        };
    }

    let rows = state
        .all_users
        .iter()
        .map(|user| {
            let ondelete = {
                let session = session.clone();
                let id = user.id;
                Callback::from(move |_: MouseEvent| {
                    let session = session.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        let _ = session.delete_user(id).await;
                    });
                })
            };

            html! {
                <tr key={user.id.to_string()}>
                    <td>{ user.name.clone() }</td>
                    <td>{ user.email.clone() }</td>
                    <td>{ user.role.to_string() }</td>
                    <td>{ if user.is_verified { "yes" } else { "no" } }</td>
                    <td>
                        { if state.is_admin() {
                            html! {
                                <button class="btn btn-danger" onclick={ondelete} disabled={state.loading}>
                                    { "Delete" }
                                </button>
                            }
                        } else {
                            html! {}
                        } }
                    </td>
                </tr>
            }
        })
        .collect::<Html>();

    html! {
        <div class="container">
            <h2>{ "Users" }</h2>
            <table class="users">
                <thead>
                    <tr>
                        <th>{ "Name" }</th>
                        <th>{ "Email" }</th>
                        <th>{ "Role" }</th>
                        <th>{ "Verified" }</th>
                        <th></th>
                    </tr>
                </thead>
                <tbody>{ rows }</tbody>
            </table>
        </div>
    }
}
