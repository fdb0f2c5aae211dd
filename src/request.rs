use http::{HeaderMap, Uri};

/// Borrowed view of the parts of an HTTP request that carry a bearer token.
///
/// Object safe, so extractors and secret providers can accept `&dyn RequestHead`
/// regardless of the body type the surrounding server uses.
pub trait RequestHead {
    fn headers(&self) -> &HeaderMap;
    fn uri(&self) -> &Uri;
}

impl<B> RequestHead for http::Request<B> {
    fn headers(&self) -> &HeaderMap {
        http::Request::headers(self)
    }

    fn uri(&self) -> &Uri {
        http::Request::uri(self)
    }
}

impl RequestHead for http::request::Parts {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn uri(&self) -> &Uri {
        &self.uri
    }
}
