use std::rc::Rc;

use yew::prelude::*;
use yew_router::prelude::*;

use super::api::HttpSessionApi;
use super::context::{Navigate, Notifier, Session};
use super::state::{Toast, ToastKind};
use crate::router::Route;

/// Value handed down through the Yew context. The revision makes consumers
/// re-render whenever the session changes.
#[derive(Clone)]
pub struct SessionContext {
    session: Session,
    revision: u64,
}

impl PartialEq for SessionContext {
    fn eq(&self, other: &Self) -> bool {
        self.session == other.session && self.revision == other.revision
    }
}

struct RouterNavigator(Option<Navigator>);

impl Navigate for RouterNavigator {
    fn navigate(&self, route: Route) {
        match &self.0 {
            Some(navigator) => navigator.push(&route),
            None => tracing::warn!("No router available, cannot navigate to {:?}", route),
        }
    }
}

/// Mirrors toasts to the log; the `Toasts` component renders them.
struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: &Toast) {
        match toast.kind {
            ToastKind::Success => tracing::info!("{}", toast.message),
            ToastKind::Error => tracing::warn!("{}", toast.message),
        }
    }
}

#[derive(Properties, PartialEq)]
pub struct UserContextProviderProps {
    #[prop_or_default]
    pub children: Html,
}

/// Creates the session once and hydrates it. Must sit inside the router.
#[function_component(UserContextProvider)]
pub fn user_context_provider(props: &UserContextProviderProps) -> Html {
    let navigator = use_navigator();
    let force_update = use_force_update();

    let session = use_memo((), move |_| {
        Session::new(
            Rc::new(HttpSessionApi::from_env()),
            Rc::new(RouterNavigator(navigator)),
            Rc::new(LogNotifier),
            Rc::new(move || force_update.force_update()),
        )
    });
    let session = (*session).clone();

    {
        let session = session.clone();
        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                session.hydrate().await;
            });
            || ()
        });
    }

    let is_admin = session.state().is_admin();
    {
        let session = session.clone();
        use_effect_with(is_admin, move |is_admin| {
            if *is_admin {
                wasm_bindgen_futures::spawn_local(async move {
                    let _ = session.get_all_users().await;
                });
            }
            || ()
        });
    }

    let context = SessionContext {
        revision: session.revision(),
        session,
    };

    html! {
        <ContextProvider<SessionContext> {context}>
            { props.children.clone() }
        </ContextProvider<SessionContext>>
    }
}

/// The session from the nearest `UserContextProvider`.
#[hook]
pub fn use_session() -> Option<Session> {
    use_context::<SessionContext>().map(|context| context.session)
}
