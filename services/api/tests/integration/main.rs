mod admin_test;
mod auth_test;
mod helpers;
mod http_test;
mod order_test;
