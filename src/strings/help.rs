//! # Help Text
//!
//! Shown for `!help` and for any unrecognized command.

pub const MAIN: &str = concat!(
    "**🎸 Encore Help**\n",
    "Use: !command _args_\n",
    "\n",
    "* setlist: Latest show setlist\n",
    "* setlist YYYY-MM-DD: Setlist for a specific date\n",
    "* ask [question]: Ask the assistant about the band\n",
    "* help: This message\n"
);
