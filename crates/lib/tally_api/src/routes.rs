//! Route paths.

pub const GET_ROOT: &str = "/";
pub const POST_REGISTER: &str = "/register";
pub const POST_LOGIN: &str = "/login";
pub const GET_VALIDATE_TOKEN: &str = "/validate-token";
pub const PUT_UPDATE_USER: &str = "/update-user";
pub const GET_USER_UID: &str = "/get-user/{uid}";
pub const DELETE_USER_UID: &str = "/delete-user/{uid}";
