/// A shell command in either pre-split or single string form.
#[derive(Ord, PartialOrd, Eq, PartialEq, Debug)]
pub enum AdbCommand<'a> {
    Slice(&'a [&'a str]),
    String(&'a str),
}

impl<'b, 'a> Into<AdbCommand<'a>> for &'b [&str]
where
    'b: 'a,
{
    fn into(self) -> AdbCommand<'a> {
        AdbCommand::Slice(self.as_ref())
    }
}

impl<'a> AdbCommand<'a> {
    /// The command as one displayable line, used for logs and errors.
    pub fn get_command(&self) -> String {
        match self {
            AdbCommand::Slice(s) => s.join(" "),
            AdbCommand::String(s) => s.to_string(),
        }
    }

    /// The command as argv tokens. A `String` form stays a single token;
    /// the device side shell does its own word splitting.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            AdbCommand::Slice(s) => s.iter().map(|x| x.to_string()).collect(),
            AdbCommand::String(s) => vec![s.to_string()],
        }
    }
}

impl<'a> Into<AdbCommand<'a>> for &'a str {
    fn into(self) -> AdbCommand<'a> {
        AdbCommand::String(self)
    }
}

impl<'a, const N: usize> Into<AdbCommand<'a>> for &'a [&'a str; N] {
    fn into(self) -> AdbCommand<'a> {
        AdbCommand::Slice(self)
    }
}

impl<'a> Into<AdbCommand<'a>> for &'a Vec<&'a str> {
    fn into(self) -> AdbCommand<'a> {
        AdbCommand::Slice(self)
    }
}

#[test]
fn test_into() {
    let a = "getprop ro.product.model";
    let b = ["getprop", "ro.product.model"];
    let c = vec!["pm", "list", "packages"];
    assert_eq!(AdbCommand::String(a), a.into());
    assert_eq!(AdbCommand::Slice(&b), (&b).into());
    assert_eq!(AdbCommand::Slice(&c), (&c).into());
}

#[test]
fn test_to_args() {
    let single: AdbCommand = "ls -l /sdcard".into();
    assert_eq!(single.to_args(), vec!["ls -l /sdcard".to_string()]);
    let split: AdbCommand = (&["ls", "-l", "/sdcard"]).into();
    assert_eq!(
        split.to_args(),
        vec!["ls".to_string(), "-l".to_string(), "/sdcard".to_string()]
    );
    assert_eq!(split.get_command(), "ls -l /sdcard");
}
