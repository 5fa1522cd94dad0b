mod timed;

pub use timed::TimedBotCheck;
