//! Mode parsing and validation

use std::str;

/// User modes advertised in welcome messages.  vireo does not let clients change them.
pub const USER_MODES: &str = "o";

/// Channel modes that have no parameters.  Advertised in welcome messages.
pub const SIMPLE_CHAN_MODES: &str = "it";

/// Channel modes that require a parameter.  Advertised in welcome messages.
pub const EXTENDED_CHAN_MODES: &str = "klo";

/// Iterator over the modes of a string.
///
/// `'+'` and `'-'` characters flip the sign state, which starts positive; any other character is
/// yielded with the current sign.
struct SimpleQuery<'a> {
    modes: str::Chars<'a>,
    value: bool,
}

impl<'a> SimpleQuery<'a> {
    pub fn new(modes: &'a str) -> Self {
        Self {
            modes: modes.chars(),
            value: true,
        }
    }
}

impl Iterator for SimpleQuery<'_> {
    type Item = (bool, char);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let c = self.modes.next()?;
            match c {
                '+' => {
                    self.value = true;
                }
                '-' => {
                    self.value = false;
                }
                c => {
                    return Some((self.value, c));
                }
            }
        }
    }
}

/// `channel_query` related errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// One of the modes in the query is unknown.
    Unknown(char, bool),

    /// A mode is missing its required parameter.
    MissingParam(char, bool),
}

/// Alias to std's Result using this module's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Item of a channel mode query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelChange<'a> {
    InviteOnly(bool),
    TopicRestricted(bool),
    Key(bool, &'a str),
    UserLimit(Option<&'a str>),
    Operator(bool, &'a str),
}

impl ChannelChange<'_> {
    /// Whether this change is enabling or disabling a mode.
    pub fn value(&self) -> bool {
        use ChannelChange::*;
        match self {
            InviteOnly(v) | TopicRestricted(v) | Key(v, _) | Operator(v, _) => *v,
            UserLimit(l) => l.is_some(),
        }
    }

    /// The letter of this mode change.
    pub fn symbol(&self) -> char {
        use ChannelChange::*;
        match self {
            InviteOnly(_) => 'i',
            TopicRestricted(_) => 't',
            Key(_, _) => 'k',
            UserLimit(_) => 'l',
            Operator(_, _) => 'o',
        }
    }

    /// The parameter of this mode change.
    pub fn param(&self) -> Option<&str> {
        use ChannelChange::*;
        match self {
            Key(true, p) | Operator(_, p) => Some(p),
            UserLimit(l) => *l,
            _ => None,
        }
    }
}

/// An iterator over the changes of a channel MODE query.
///
/// Parameter-taking modes consume from `params` in order of appearance in the mode string.
///
/// # Example
///
/// ```rust
/// # use vireo_tokens::mode::{self, Error, ChannelChange};
/// let mut query = mode::channel_query("-olX+ki", &["ada", "secret_key"]);
///
/// assert_eq!(query.next(), Some(Ok(ChannelChange::Operator(false, "ada"))));
/// assert_eq!(query.next(), Some(Ok(ChannelChange::UserLimit(None))));
/// assert_eq!(query.next(), Some(Err(Error::Unknown('X', false))));
/// assert_eq!(query.next(), Some(Ok(ChannelChange::Key(true, "secret_key"))));
/// assert_eq!(query.next(), Some(Ok(ChannelChange::InviteOnly(true))));
/// assert_eq!(query.next(), None);
/// ```
pub fn channel_query<'a, I, S>(
    modes: &'a str,
    params: I,
) -> impl Iterator<Item = Result<ChannelChange<'a>>>
where
    I: IntoIterator<Item = &'a S> + 'a,
    S: AsRef<str> + 'a,
{
    let mut params = params
        .into_iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.is_empty());
    SimpleQuery::new(modes).map(move |(value, mode)| {
        use ChannelChange::*;
        match mode {
            'i' => Ok(InviteOnly(value)),
            't' => Ok(TopicRestricted(value)),
            'k' => {
                if value {
                    if let Some(param) = params.next() {
                        Ok(Key(true, param))
                    } else {
                        Err(Error::MissingParam('k', value))
                    }
                } else {
                    // "MODE -k" clears the key, with or without a parameter.
                    Ok(Key(false, params.next().unwrap_or("*")))
                }
            }
            'l' => {
                if value {
                    if let Some(param) = params.next() {
                        Ok(UserLimit(Some(param)))
                    } else {
                        Err(Error::MissingParam('l', value))
                    }
                } else {
                    Ok(UserLimit(None))
                }
            }
            'o' => {
                if let Some(param) = params.next() {
                    Ok(Operator(value, param))
                } else {
                    Err(Error::MissingParam('o', value))
                }
            }
            other => Err(Error::Unknown(other, value)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_query() {
        let mut q = SimpleQuery::new("+ab+C++D+-+E--fg+-h");
        assert_eq!(q.next(), Some((true, 'a')));
        assert_eq!(q.next(), Some((true, 'b')));
        assert_eq!(q.next(), Some((true, 'C')));
        assert_eq!(q.next(), Some((true, 'D')));
        assert_eq!(q.next(), Some((true, 'E')));
        assert_eq!(q.next(), Some((false, 'f')));
        assert_eq!(q.next(), Some((false, 'g')));
        assert_eq!(q.next(), Some((false, 'h')));
        assert_eq!(q.next(), None);

        let mut q = SimpleQuery::new("a");
        assert_eq!(q.next(), Some((true, 'a')));
        assert_eq!(q.next(), None);

        let mut q = SimpleQuery::new("");
        assert_eq!(q.next(), None);
    }

    #[test]
    fn test_chanmode_key() {
        let mut q = channel_query::<_, String>("+k", &[]);
        assert_eq!(q.next(), Some(Err(Error::MissingParam('k', true))));
        assert_eq!(q.next(), None);

        let mut q = channel_query("+k", &["beer"]);
        assert_eq!(q.next(), Some(Ok(ChannelChange::Key(true, "beer"))));
        assert_eq!(q.next(), None);

        let mut q = channel_query::<_, String>("-k", &[]);
        assert_eq!(q.next(), Some(Ok(ChannelChange::Key(false, "*"))));
        assert_eq!(q.next(), None);

        let mut q = channel_query("-k", &["beer"]);
        assert_eq!(q.next(), Some(Ok(ChannelChange::Key(false, "beer"))));
        assert_eq!(q.next(), None);
    }

    #[test]
    fn test_chanmode_params_in_order() {
        let mut q = channel_query("+kl", &["beer", "42"]);
        assert_eq!(q.next(), Some(Ok(ChannelChange::Key(true, "beer"))));
        assert_eq!(q.next(), Some(Ok(ChannelChange::UserLimit(Some("42")))));
        assert_eq!(q.next(), None);

        let mut q = channel_query("+lk", &["42", "beer"]);
        assert_eq!(q.next(), Some(Ok(ChannelChange::UserLimit(Some("42")))));
        assert_eq!(q.next(), Some(Ok(ChannelChange::Key(true, "beer"))));
        assert_eq!(q.next(), None);

        let mut q = channel_query("+o-o", &["ada", "mal"]);
        assert_eq!(q.next(), Some(Ok(ChannelChange::Operator(true, "ada"))));
        assert_eq!(q.next(), Some(Ok(ChannelChange::Operator(false, "mal"))));
        assert_eq!(q.next(), None);

        let mut q = channel_query::<_, String>("+o", &[]);
        assert_eq!(q.next(), Some(Err(Error::MissingParam('o', true))));
        assert_eq!(q.next(), None);
    }

    #[test]
    fn test_chanmode_unknown() {
        let mut q = channel_query::<_, String>("+iw", &[]);
        assert_eq!(q.next(), Some(Ok(ChannelChange::InviteOnly(true))));
        assert_eq!(q.next(), Some(Err(Error::Unknown('w', true))));
        assert_eq!(q.next(), None);
    }
}
