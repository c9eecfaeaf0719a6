mod health;
mod redirect;

pub use health::health_handler;
pub use redirect::{
    create_redirect_handler, delete_redirect_handler, get_redirect_handler,
    list_redirects_handler, public_url_handler, update_redirect_handler,
};
