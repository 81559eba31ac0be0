// SPDX-License-Identifier: BUSL-1.1
//! # Post Subcommand
//!
//! - `list`: posts of one community, newest first.
//! - `create`: post into a community as the logged-in admin. Needs a user
//!   id in the cached session.
//! - `like` / `share`: bump a post's counters.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

use tribune_client::Post;
use tribune_core::{CommunityId, PostId, PostType};
use tribune_state::{NewPost, PostError};

use crate::console::{api_failure, Console, EXIT_FAILURE, EXIT_LOGIN_REQUIRED, EXIT_OK};

/// Arguments for the `tribune post` subcommand.
#[derive(Args, Debug)]
pub struct PostArgs {
    #[command(subcommand)]
    pub command: PostCommand,
}

/// Post subcommands.
#[derive(Subcommand, Debug)]
pub enum PostCommand {
    /// List the posts of a community.
    List {
        /// Community identifier.
        #[arg(long)]
        community: String,
    },

    /// Create a post.
    Create {
        /// Community identifier.
        #[arg(long)]
        community: String,
        /// Post text.
        #[arg(long)]
        content: String,
        /// Audience.
        #[arg(long = "type", value_enum, default_value_t = PostTypeArg::Public)]
        post_type: PostTypeArg,
    },

    /// Like a post.
    Like {
        /// Post identifier.
        id: String,
    },

    /// Share a post.
    Share {
        /// Post identifier.
        id: String,
    },
}

/// Post audience as a flag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PostTypeArg {
    Public,
    Member,
    Event,
}

impl From<PostTypeArg> for PostType {
    fn from(arg: PostTypeArg) -> Self {
        match arg {
            PostTypeArg::Public => Self::Public,
            PostTypeArg::Member => Self::Member,
            PostTypeArg::Event => Self::Event,
        }
    }
}

/// Execute the post subcommand.
pub async fn run_post(args: &PostArgs, console: &Console) -> Result<u8> {
    let Some(session) = console.require_admin() else {
        return Ok(EXIT_LOGIN_REQUIRED);
    };
    let posts = console.client().posts();

    match &args.command {
        PostCommand::List { community } => {
            let id = CommunityId::new(community.as_str())?;
            match posts.list(&id).await {
                Ok(listing) => {
                    if listing.is_empty() {
                        println!("No posts.");
                    }
                    for post in &listing {
                        println!("{}", render_post(post));
                    }
                    Ok(EXIT_OK)
                }
                Err(e) => api_failure(e),
            }
        }

        PostCommand::Create {
            community,
            content,
            post_type,
        } => {
            let id = CommunityId::new(community.as_str())?;
            let draft = match NewPost::compose(&session, id, content, (*post_type).into()) {
                Ok(draft) => draft,
                Err(e) => {
                    eprintln!("{e}. {}", compose_hint(&e));
                    return Ok(compose_exit_code(&e));
                }
            };
            match posts.create(&draft).await {
                Ok(created) => {
                    println!("Posted {} to {}.", created.id, draft.community_id);
                    Ok(EXIT_OK)
                }
                Err(e) => api_failure(e),
            }
        }

        PostCommand::Like { id } => {
            let id = PostId::new(id.as_str())?;
            match posts.like(&id).await {
                Ok(()) => {
                    println!("Liked {id}.");
                    Ok(EXIT_OK)
                }
                Err(e) => api_failure(e),
            }
        }

        PostCommand::Share { id } => {
            let id = PostId::new(id.as_str())?;
            match posts.share(&id).await {
                Ok(()) => {
                    println!("Shared {id}.");
                    Ok(EXIT_OK)
                }
                Err(e) => api_failure(e),
            }
        }
    }
}

fn compose_hint(err: &PostError) -> &'static str {
    match err {
        PostError::SessionInvalid(_) => "Run `tribune login`.",
        PostError::Validation(_) => "Nothing was posted.",
    }
}

/// A session without an identity sends the operator back to login.
pub fn compose_exit_code(err: &PostError) -> u8 {
    match err {
        PostError::SessionInvalid(_) => EXIT_LOGIN_REQUIRED,
        PostError::Validation(_) => EXIT_FAILURE,
    }
}

/// One listing line: id, audience, likes, shares, comments, author, text.
pub fn render_post(post: &Post) -> String {
    format!(
        "{:<26} {:<7} {:>3} likes {:>3} shares {:>3} comments  {}: {}",
        post.id.as_str(),
        post.post_type.as_str(),
        post.likes,
        post.shares,
        post.comment_count,
        post.author_name,
        post.content
    )
}
