//! Fixtures shared by the benches.

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    file: TestFile,
}

impl TestCase {
    pub fn new(name: &'static str, file: TestFile) -> Self {
        Self { name, file }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }
}

/// A wire fixture under `resources/`.
#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}

/// `(method, pattern)` pairs of a REST API with captures at several depths.
pub const API_ROUTES: &[(&str, &str)] = &[
    ("POST", "/1/classes/:className"),
    ("GET", "/1/classes/:className/:objectId"),
    ("PUT", "/1/classes/:className/:objectId"),
    ("GET", "/1/classes/:className"),
    ("DELETE", "/1/classes/:className/:objectId"),
    ("POST", "/1/users"),
    ("GET", "/1/login"),
    ("GET", "/1/users/:objectId"),
    ("PUT", "/1/users/:objectId"),
    ("GET", "/1/users"),
    ("DELETE", "/1/users/:objectId"),
    ("POST", "/1/requestPasswordReset"),
    ("POST", "/1/roles"),
    ("GET", "/1/roles/:objectId"),
    ("PUT", "/1/roles/:objectId"),
    ("GET", "/1/roles"),
    ("DELETE", "/1/roles/:objectId"),
    ("POST", "/1/files/:fileName"),
    ("POST", "/1/events/:eventName"),
    ("POST", "/1/push"),
    ("POST", "/1/installations"),
    ("GET", "/1/installations/:objectId"),
    ("PUT", "/1/installations/:objectId"),
    ("GET", "/1/installations"),
    ("DELETE", "/1/installations/:objectId"),
    ("POST", "/1/functions"),
];

/// One request per entry of [`API_ROUTES`], in the same order.
pub const API_REQUESTS: &[(&str, &str)] = &[
    ("POST", "/1/classes/test"),
    ("GET", "/1/classes/test/test"),
    ("PUT", "/1/classes/test/test"),
    ("GET", "/1/classes/test"),
    ("DELETE", "/1/classes/test/test"),
    ("POST", "/1/users"),
    ("GET", "/1/login"),
    ("GET", "/1/users/test"),
    ("PUT", "/1/users/test"),
    ("GET", "/1/users"),
    ("DELETE", "/1/users/test"),
    ("POST", "/1/requestPasswordReset"),
    ("POST", "/1/roles"),
    ("GET", "/1/roles/test"),
    ("PUT", "/1/roles/test"),
    ("GET", "/1/roles"),
    ("DELETE", "/1/roles/test"),
    ("POST", "/1/files/test"),
    ("POST", "/1/events/test"),
    ("POST", "/1/push"),
    ("POST", "/1/installations"),
    ("GET", "/1/installations/test"),
    ("PUT", "/1/installations/test"),
    ("GET", "/1/installations"),
    ("DELETE", "/1/installations/test"),
    ("POST", "/1/functions"),
];
