//! Process argument parsing.

use std::ffi::OsString;

use clap::Parser;

use crate::{Credentials, Error, Result};

/// Positional arguments: endpoint identifier and secret.
#[derive(Parser, Debug)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Args {
    #[arg(allow_hyphen_values = true)]
    endpoint_id: String,

    #[arg(allow_hyphen_values = true)]
    secret: String,
}

/// Parse process arguments (program name first) into credentials.
///
/// Anything other than exactly two arguments after the program name is a
/// usage error. Both are taken verbatim, so a secret such as `-s3cr3t` or
/// `--` is a value, never a flag. clap's own rendering is discarded: the
/// agent prints its own usage text on stdout.
pub fn parse_credentials<I, T>(args: I) -> Result<Credentials>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    // ---
    let mut argv: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if argv.len() != 3 {
        return Err(Error::Usage);
    }

    // Everything after the escape is positional.
    argv.insert(1, OsString::from("--"));

    let args = Args::try_parse_from(argv).map_err(|_| Error::Usage)?;
    Ok(Credentials::new(args.endpoint_id, args.secret))
}
