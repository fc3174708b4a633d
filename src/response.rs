pub mod responder;

pub type HttpResponse = http::Response<Option<String>>;
