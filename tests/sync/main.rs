mod change_feed;
mod helpers;
mod membership;
mod projects;
mod session;
