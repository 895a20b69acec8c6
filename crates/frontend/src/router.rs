use yew::prelude::*;
use yew_router::prelude::*;

use crate::pages::{
    admin::Admin, forgot_password::ForgotPassword, home::Home, login::Login,
    not_found::NotFound, register::Register, reset_password::ResetPassword,
    verify_email::VerifyEmail,
};

#[derive(Debug, Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Home,
    #[at("/login")]
    Login,
    #[at("/register")]
    Register,
    #[at("/forgot-password")]
    ForgotPassword,
    #[at("/reset-password/:token")]
    ResetPassword { token: String },
    #[at("/verify-email/:token")]
    VerifyEmail { token: String },
    #[at("/admin")]
    Admin,
    #[not_found]
    #[at("/404")]
    NotFound,
}

pub fn switch(routes: Route) -> Html {
    match routes {
        Route::Home => html! { <Home /> },
        Route::Login => html! { <Login /> },
        Route::Register => html! { <Register /> },
        Route::ForgotPassword => html! { <ForgotPassword /> },
        Route::ResetPassword { token } => html! { <ResetPassword {token} /> },
        Route::VerifyEmail { token } => html! { <VerifyEmail {token} /> },
        Route::Admin => html! { <Admin /> },
        Route::NotFound => html! { <NotFound /> },
    }
}
