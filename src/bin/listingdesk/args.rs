//! Command-line surface for `listingdesk`.

#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use listingdesk::config::SettingsOverrides;
use listingdesk_api_types::{AccountId, AnalyticsPeriod, PostId, UserId};

#[derive(Parser, Debug)]
#[command(
    name = "listingdesk",
    version,
    about = "Operator console for the Marketplace listing scheduler",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub settings: SettingsOverrides,

    /// Path to a file holding a bearer token (takes precedence over the stored login)
    #[arg(long, env = "LISTINGDESK_TOKEN_FILE", global = true)]
    pub token_file: Option<PathBuf>,

    /// Bearer token from env (CLI flag intentionally disabled to avoid shell history leaks)
    #[arg(long = "token-env", hide = true, env = "LISTINGDESK_TOKEN")]
    pub token_env: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Facebook account management
    Accounts(AccountsArgs),
    /// Scheduled listings, bulk actions and posting jobs
    Posts(PostsArgs),
    /// Created vs posted counts over a period
    Analytics {
        #[arg(long, value_enum, default_value_t = PeriodArg::Lifetime)]
        period: PeriodArg,
        /// Restrict to one account email
        #[arg(long)]
        account: Option<String>,
    },
    /// Dashboard counters
    Stats,
    /// Login, registration and profile
    Auth(AuthArgs),
    /// Dashboard user approval (staff only)
    Users(UsersArgs),
    /// Local activity log
    Activity(ActivityArgs),
}

#[derive(Parser, Debug)]
pub struct AccountsArgs {
    #[command(subcommand)]
    pub action: AccountsCmd,
}

#[derive(Subcommand, Debug)]
pub enum AccountsCmd {
    /// List accounts
    List,
    /// Add an account with stored credentials
    Add {
        #[arg(long)]
        email: String,
        #[command(flatten)]
        password: PasswordInput,
    },
    /// Add an account and log in to Facebook right away
    AddWithLogin {
        #[arg(long)]
        email: String,
        #[command(flatten)]
        password: PasswordInput,
    },
    /// Add an account whose session is created by a manual browser login
    ManualLogin {
        #[arg(long)]
        email: String,
    },
    /// Upload a .txt file with one email:password pair per line
    BulkUpload {
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete one or more accounts
    Delete {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<AccountId>,
    },
    /// Open a browser login to refresh the account's session
    UpdateSession { id: AccountId },
    /// Session and posting health of every account
    Health,
    /// Check whether the stored session still works
    ValidateSession { id: AccountId },
}

#[derive(Parser, Debug)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub action: PostsCmd,
}

#[derive(Subcommand, Debug)]
pub enum PostsCmd {
    /// List posts, optionally one partition only
    List {
        #[arg(long, value_enum)]
        partition: Option<PartitionArg>,
    },
    /// Counts of total, posted, pending and failed posts
    Summary,
    /// Schedule a new listing
    Create {
        #[arg(long)]
        account_id: AccountId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        description_file: Option<PathBuf>,
        #[arg(long)]
        price: String,
        /// RFC3339 timestamp
        #[arg(long)]
        scheduled_time: String,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Edit a listing; omitted fields stay unchanged
    Update {
        id: PostId,
        #[arg(long)]
        account_id: Option<AccountId>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        description_file: Option<PathBuf>,
        #[arg(long)]
        price: Option<String>,
        /// RFC3339 timestamp
        #[arg(long)]
        scheduled_time: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Delete one post
    Delete { id: PostId },
    /// Delete the given posts (or the whole partition with --all)
    DeleteSelected {
        #[arg(long, value_enum, default_value_t = PartitionArg::Pending)]
        partition: PartitionArg,
        #[arg(long, conflicts_with = "ids")]
        all: bool,
        ids: Vec<PostId>,
    },
    /// Start posting the given pending posts, or every pending post
    Start {
        ids: Vec<PostId>,
        /// Follow the job until it finishes
        #[arg(long)]
        watch: bool,
    },
    /// Follow an existing posting job until it finishes
    Watch { job_id: String },
    /// Fetch one posting job snapshot
    JobStatus { job_id: String },
    /// Posting errors recorded by the backend
    ErrorLogs,
    /// Upload a CSV of listings for one or more accounts
    BulkUpload {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long = "account", required = true, num_args = 1..)]
        accounts: Vec<AccountId>,
    },
}

#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthCmd,
}

#[derive(Subcommand, Debug)]
pub enum AuthCmd {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[command(flatten)]
        password: PasswordInput,
    },
    /// Request a dashboard account (needs staff approval)
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[command(flatten)]
        password: PasswordInput,
    },
    /// Drop the stored session
    Logout,
    /// Show the logged-in user
    Me,
    /// Change username, email or display name
    UpdateProfile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Change the dashboard password
    ChangePassword {
        /// File holding the current password
        #[arg(long, env = "LISTINGDESK_OLD_PASSWORD_FILE")]
        old_password_file: PathBuf,
        /// File holding the new password
        #[arg(long, env = "LISTINGDESK_NEW_PASSWORD_FILE")]
        new_password_file: PathBuf,
    },
}

#[derive(Parser, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub action: UsersCmd,
}

#[derive(Subcommand, Debug)]
pub enum UsersCmd {
    /// List dashboard users
    List {
        /// Only users waiting for approval
        #[arg(long)]
        pending: bool,
    },
    /// Approve a registration
    Approve { id: UserId },
    /// Revoke a user's approval
    Disapprove { id: UserId },
}

#[derive(Parser, Debug)]
pub struct ActivityArgs {
    #[command(subcommand)]
    pub action: ActivityCmd,
}

#[derive(Subcommand, Debug)]
pub enum ActivityCmd {
    /// Entries of the last retention window, newest first
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Remove every entry
    Clear,
}

/// Password source; the file wins over the environment.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PasswordInput {
    /// File holding the password
    #[arg(long, env = "LISTINGDESK_PASSWORD_FILE")]
    pub password_file: Option<PathBuf>,

    /// Password from env (CLI flag intentionally disabled to avoid shell history leaks)
    #[arg(long = "password-env", hide = true, env = "LISTINGDESK_PASSWORD")]
    pub password_env: Option<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum PartitionArg {
    Pending,
    Posted,
}

impl From<PartitionArg> for listingdesk::domain::selection::Partition {
    fn from(value: PartitionArg) -> Self {
        match value {
            PartitionArg::Pending => Self::Pending,
            PartitionArg::Posted => Self::Posted,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum PeriodArg {
    Weekly,
    Monthly,
    Lifetime,
}

impl From<PeriodArg> for AnalyticsPeriod {
    fn from(value: PeriodArg) -> Self {
        match value {
            PeriodArg::Weekly => Self::Weekly,
            PeriodArg::Monthly => Self::Monthly,
            PeriodArg::Lifetime => Self::Lifetime,
        }
    }
}
