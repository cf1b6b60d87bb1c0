use alloy::primitives::Address;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use judol_rust_sdk::judol::file_upload_from_path;
use judol_rust_sdk::{
    Judol, JudolConfiguration, PaperDraft, PaperStatus, PaperType, Proposal, ProposalLookup,
};
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "judol")]
#[command(about = "JUDOL academic publishing: governance, papers and IPFS uploads", long_about = None)]
struct Cli {
    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the governance quorum threshold
    Quorum,

    /// List all governance proposals, newest first
    Proposals {
        /// Keep listing on every refresh (requires JUDOL_PROPOSAL_REFRESH_SECS)
        #[arg(long)]
        watch: bool,
    },

    /// Show one proposal with its voting statistics
    Proposal {
        /// Proposal id, or "pending"
        id: String,
    },

    /// List votes cast by an address
    Receipts { voter: String },

    /// Check whether an address is a registered verifier
    Verifier { account: String },

    /// List catalog papers
    Papers {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        #[arg(long)]
        search: Option<String>,
    },

    /// Upload a paper, pin its metadata and mint it when a signer is configured
    Upload {
        file: PathBuf,

        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        #[arg(long, default_value = "")]
        organization: String,

        #[arg(long = "abstract", default_value = "")]
        abstract_text: String,

        #[arg(long)]
        dataset: bool,

        #[arg(long, default_value = "CC BY 4.0")]
        license: String,

        #[arg(long)]
        sinta_rank: Option<u8>,

        #[arg(long, default_value = "0 USDC")]
        price: String,
    },

    /// Cast a vote on a proposal
    Vote {
        id: u64,

        #[arg(long, conflicts_with = "against")]
        support: bool,

        #[arg(long)]
        against: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Verified,
    Processing,
    DataPool,
}

impl From<StatusArg> for PaperStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Verified => PaperStatus::Verified,
            StatusArg::Processing => PaperStatus::Processing,
            StatusArg::DataPool => PaperStatus::DataPool,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("judol={level},judol_rust_sdk={level},api={level},contracts={level}"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_proposals(judol: &Judol, proposals: &[Proposal], json: bool) -> Result<()> {
    if json {
        return print_json(&proposals);
    }
    for proposal in proposals {
        let stats = judol.voting_stats(proposal);
        println!(
            "#{:<4} {:<9} {:>5.1}% for  quorum {:>5.1}%  {:<10} {}",
            proposal.id,
            proposal.status.to_string(),
            stats.vote_percentage,
            stats.quorum_percentage,
            stats.time_left_display,
            proposal.title
        );
    }
    Ok(())
}

fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim()).with_context(|| format!("invalid address: {value}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = JudolConfiguration::from_env()?;
    let judol = Judol::new(config)?;

    match cli.command {
        Commands::Quorum => {
            let quorum = judol.fetch_min_quorum().await?;
            if cli.json {
                return print_json(&quorum);
            }
            println!("Minimum quorum: {} bps ({:.2}%)", quorum.bps, quorum.percentage);
        }
        Commands::Proposals { watch: false } => {
            let proposals = judol.fetch_all_proposals().await?;
            print_proposals(&judol, &proposals, cli.json)?;
        }
        Commands::Proposals { watch: true } => {
            let (mut rx, handle) = judol
                .spawn_proposal_refresh()
                .context("set JUDOL_PROPOSAL_REFRESH_SECS to watch proposals")?;
            while rx.changed().await.is_ok() {
                let proposals = rx.borrow_and_update().clone();
                print_proposals(&judol, &proposals, cli.json)?;
            }
            handle.abort();
        }
        Commands::Proposal { id } => {
            let lookup = ProposalLookup::from_str(&id)
                .with_context(|| format!("invalid proposal id: {id}"))?;
            let Some(proposal) = judol.fetch_proposal(lookup).await? else {
                println!("Proposal is still pending");
                return Ok(());
            };
            let stats = judol.voting_stats(&proposal);
            if cli.json {
                return print_json(&serde_json::json!({ "proposal": proposal, "stats": stats }));
            }
            println!("#{} {}", proposal.id, proposal.title);
            println!("{}", proposal.description);
            println!(
                "status: {}  votes: {} for / {} against ({:.1}% for)",
                proposal.status, proposal.votes_for, proposal.votes_against, stats.vote_percentage
            );
            println!(
                "quorum: {}/{} ({:.1}%{})  time left: {}",
                proposal.total_votes,
                proposal.required_votes,
                stats.quorum_percentage,
                if stats.quorum_reached { ", reached" } else { "" },
                stats.time_left_display
            );
        }
        Commands::Receipts { voter } => {
            let voter = parse_address(&voter)?;
            let receipts = judol.fetch_vote_receipts(Some(voter)).await;
            if cli.json {
                return print_json(&receipts);
            }
            if receipts.is_empty() {
                println!("No votes found for {voter}");
            }
            for receipt in &receipts {
                println!(
                    "proposal #{:<4} {:<7} weight {}  at {}  tx {}",
                    receipt.proposal_id,
                    if receipt.support { "FOR" } else { "AGAINST" },
                    receipt.weight,
                    receipt.timestamp,
                    receipt.transaction_hash
                );
            }
        }
        Commands::Verifier { account } => {
            let account = parse_address(&account)?;
            let verified = judol.is_verifier(account).await?;
            println!("{account} is {}a registered verifier", if verified { "" } else { "not " });
        }
        Commands::Papers { status, search } => {
            let catalog = judol.papers();
            let mut papers = match &search {
                Some(query) => catalog.search(query),
                None => catalog.all().iter().collect(),
            };
            if let Some(status) = status {
                let status = PaperStatus::from(status);
                papers.retain(|p| p.status == status);
            }
            if cli.json {
                return print_json(&papers);
            }
            for paper in papers {
                println!(
                    "[{}] {} - {} ({}) AI {} {}",
                    paper.id,
                    paper.title,
                    paper.author,
                    paper.organization,
                    paper.ai_score,
                    paper.price
                );
            }
        }
        Commands::Upload {
            file,
            title,
            author,
            organization,
            abstract_text,
            dataset,
            license,
            sinta_rank,
            price,
        } => {
            let upload = file_upload_from_path(&file).await?;
            let draft = PaperDraft {
                title,
                author,
                organization,
                abstract_text,
                paper_type: if dataset { PaperType::Dataset } else { PaperType::Research },
                license,
                sinta_rank,
                price,
            };
            let paper = judol
                .submit_paper(draft, upload)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            if cli.json {
                return print_json(&paper);
            }
            println!(
                "Submitted {} (cid {})",
                paper.id,
                paper.ipfs_hash.as_deref().unwrap_or("-")
            );
            if let Some(token_id) = &paper.token_id {
                println!("Minted token #{token_id}");
            }
        }
        Commands::Vote { id, support, against } => {
            if support == against {
                anyhow::bail!("pass exactly one of --support or --against");
            }
            let tx_hash = judol
                .cast_vote(id, support)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Vote submitted: {tx_hash}");
        }
    }

    Ok(())
}
