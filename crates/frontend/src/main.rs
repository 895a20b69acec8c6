mod components;
mod pages;
mod router;
mod session;

use yew::prelude::*;
use yew_router::{BrowserRouter, Switch};

use crate::components::{header::Header, toasts::Toasts};
use crate::router::{switch, Route};
use crate::session::UserContextProvider;

#[function_component(App)]
fn app() -> Html {
    html! {
        <BrowserRouter>
            <UserContextProvider>
                <div id="app">
                    <Header />
                    <Toasts />
                    <main>
                        <Switch<Route> render={switch} />
                    </main>
                </div>
            </UserContextProvider>
        </BrowserRouter>
    }
}

fn main() {
    tracing_wasm::set_as_global_default();

    yew::Renderer::<App>::new().render();
}
