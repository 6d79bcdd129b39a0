/// One benchmarked request shape: an inbound method and the payload it carries.
#[derive(Debug, Copy, Clone)]
pub struct BenchCase {
    name: &'static str,
    method: &'static str,
    payload: PayloadFile,
}

impl BenchCase {
    pub fn new(name: &'static str, method: &'static str, payload: PayloadFile) -> Self {
        Self { name, method, payload }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn payload(&self) -> &PayloadFile {
        &self.payload
    }
}

#[derive(Debug, Copy, Clone)]
pub struct PayloadFile {
    file_name: &'static str,
    content: &'static str,
}

impl PayloadFile {
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
