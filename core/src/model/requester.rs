// ordergate/src/model/requester.rs

/// Who is checking out, as established by a verified session. Never taken from the request
/// body: points and vouchers are only ever touched for `Customer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
  Guest,
  Customer(String),
}

impl Requester {
  pub fn user_id(&self) -> Option<&str> {
    match self {
      Requester::Guest => None,
      Requester::Customer(id) => Some(id),
    }
  }

  pub fn is_guest(&self) -> bool {
    matches!(self, Requester::Guest)
  }
}
