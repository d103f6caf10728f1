use crate::token::TT;
use ahash::HashMap;
use ahash::HashMapExt;
use once_cell::sync::Lazy;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Associativity {
  Left,
  Right,
}

#[derive(Clone, Copy, Debug)]
pub struct Operator {
  pub precedence: u8,
  pub associativity: Associativity,
}

const fn left(precedence: u8) -> Operator {
  Operator {
    precedence,
    associativity: Associativity::Left,
  }
}

// Higher binds tighter. Only binary operators parsed by precedence climbing are listed; assignment, the
// conditional operator and the comma operator are handled by dedicated productions.
#[rustfmt::skip]
pub static BINARY_OPERATORS: Lazy<HashMap<TT, Operator>> = Lazy::new(|| {
  let mut map = HashMap::<TT, Operator>::new();
  map.insert(TT::QuestionQuestion, left(4));
  map.insert(TT::BarBar, left(4));
  map.insert(TT::AmpersandAmpersand, left(5));
  map.insert(TT::Bar, left(6));
  map.insert(TT::Caret, left(7));
  map.insert(TT::Ampersand, left(8));
  map.insert(TT::EqualsEquals, left(9));
  map.insert(TT::EqualsEqualsEquals, left(9));
  map.insert(TT::ExclamationEquals, left(9));
  map.insert(TT::ExclamationEqualsEquals, left(9));
  map.insert(TT::ChevronLeft, left(10));
  map.insert(TT::ChevronLeftEquals, left(10));
  map.insert(TT::ChevronRight, left(10));
  map.insert(TT::ChevronRightEquals, left(10));
  map.insert(TT::KeywordIn, left(10));
  map.insert(TT::KeywordInstanceof, left(10));
  map.insert(TT::ChevronLeftChevronLeft, left(11));
  map.insert(TT::ChevronRightChevronRight, left(11));
  map.insert(TT::ChevronRightChevronRightChevronRight, left(11));
  map.insert(TT::Plus, left(12));
  map.insert(TT::Hyphen, left(12));
  map.insert(TT::Asterisk, left(13));
  map.insert(TT::Slash, left(13));
  map.insert(TT::Percent, left(13));
  map.insert(TT::AsteriskAsterisk, Operator {
    precedence: 14,
    associativity: Associativity::Right,
  });
  map
});
