//! gymfit - Local-first gym training tracker

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use gymfit::auth::NewUser;
use gymfit::challenge::{MarkOutcome, NewChallenge};
use gymfit::history::format_elapsed;
use gymfit::stats::Analytics;
use gymfit::tui::App;
use gymfit::workout::{DEFAULT_KIND, NewExercise, NewWorkout};
use gymfit::{GymFit, SqliteStore, catalog};

const DB_PATH: &str = "gymfit.db";

#[derive(Parser)]
#[command(name = "gymfit")]
#[command(author, version, about = "GymFit - treinos, desafios e XP no terminal")]
struct Cli {
    /// Arquivo do banco local
    #[arg(long, env = "GYMFIT_DB", default_value = DB_PATH, global = true)]
    db: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Abrir o painel no terminal
    Tui,

    /// Criar uma conta
    Cadastro {
        #[arg(short, long)]
        nome: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        senha: String,

        #[arg(short, long)]
        idade: u32,

        /// Objetivo (ganhar_massa, perder_peso, definicao, forca, resistencia, condicionamento)
        #[arg(short, long)]
        objetivo: String,
    },

    /// Entrar com e-mail e senha
    Login { email: String, senha: String },

    /// Sair da conta
    Logout,

    /// Ver o perfil; com argumentos, editar
    Perfil {
        #[arg(long)]
        nome: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        idade: Option<u32>,

        #[arg(long)]
        objetivo: Option<String>,
    },

    /// Treinos
    #[command(subcommand)]
    Treino(TreinoCommands),

    /// Desafios
    #[command(subcommand)]
    Desafio(DesafioCommands),

    /// Histórico de treinos realizados
    Historico {
        /// Quantidade de registros
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Estatísticas de treino
    Stats,
}

#[derive(Subcommand)]
enum TreinoCommands {
    /// Criar um treino (vale +50 XP)
    Criar {
        #[arg(short, long)]
        nome: String,

        #[arg(short, long)]
        descricao: String,

        /// Objetivo (ganhar_massa, perder_peso, definicao, forca, resistencia, condicionamento)
        #[arg(short, long)]
        objetivo: String,

        /// Tipo livre (ex: musculacao, cardio, funcional)
        #[arg(short, long, default_value = DEFAULT_KIND)]
        tipo: String,

        /// Duração planejada em minutos
        #[arg(long)]
        duracao: Option<u32>,

        /// Exercício no formato "nome:SERIESxREPS" (ex: "Supino:4x12"); repita a flag
        #[arg(short, long = "exercicio")]
        exercicios: Vec<String>,
    },

    /// Listar os treinos da conta
    Listar,

    /// Realizar um treino (abre o cronômetro no terminal)
    Iniciar { id: i64 },
}

#[derive(Subcommand)]
enum DesafioCommands {
    /// Criar um desafio
    Criar {
        #[arg(short, long)]
        nome: String,

        #[arg(short, long)]
        descricao: String,

        /// Meta numérica (ex: quantidade de treinos)
        #[arg(short, long)]
        meta: u32,

        /// Tipo (treinos, dias_consecutivos, exercicios, tempo, personalizado)
        #[arg(short, long, default_value = "treinos")]
        tipo: String,

        /// Recompensa de XP (50, 100, 150, 200, 300 ou 500)
        #[arg(short = 'x', long, default_value = "100")]
        xp: u64,
    },

    /// Listar todos os desafios
    Listar,

    /// Participar de um desafio
    Iniciar { id: i64 },

    /// Marcar ou desmarcar um treino em um desafio
    Marcar { desafio: i64, treino: i64 },

    /// Concluir um desafio e receber o XP
    Concluir { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let store = Arc::new(SqliteStore::open(&cli.db)?);
    let gym = GymFit::new(store);

    match cli.command {
        Some(Commands::Cadastro {
            nome,
            email,
            senha,
            idade,
            objetivo,
        }) => {
            let user = gym
                .accounts
                .register(NewUser {
                    name: nome,
                    email,
                    password: senha,
                    age: idade,
                    goal: objetivo,
                })
                .await?;
            println!("Conta criada com sucesso! Bem-vindo(a), {}", user.name);
        }

        Some(Commands::Login { email, senha }) => {
            let user = gym.accounts.login(&email, &senha).await?;
            println!("Login efetuado: {} (⭐ {} XP)", user.name, user.xp);
        }

        Some(Commands::Logout) => {
            gym.accounts.logout().await?;
            println!("Até a próxima!");
        }

        Some(Commands::Perfil {
            nome,
            email,
            idade,
            objetivo,
        }) => {
            let user = gym.accounts.require_current().await?;
            if nome.is_none() && email.is_none() && idade.is_none() && objetivo.is_none() {
                let goal = catalog::find_goal(&user.goal)
                    .map(|g| format!("{} {}", g.icon, g.label))
                    .unwrap_or_else(|| user.goal.clone());
                println!("Meu Perfil");
                println!("{:-<40}", "");
                println!("Nome:     {}", user.name);
                println!("E-mail:   {}", user.email);
                println!("Idade:    {}", user.age);
                println!("Objetivo: {}", goal);
                println!("⭐ {} XP | Nível {}", user.xp, user.level());
                println!("Próximo nível: faltam {} XP", user.xp_to_next_level());
            } else {
                gym.accounts
                    .save_profile(
                        nome.unwrap_or_else(|| user.name.clone()),
                        email.unwrap_or_else(|| user.email.clone()),
                        idade.unwrap_or(user.age),
                        objetivo.unwrap_or_else(|| user.goal.clone()),
                    )
                    .await?;
                println!("Perfil atualizado com sucesso!");
            }
        }

        Some(Commands::Treino(cmd)) => run_treino(&gym, cmd).await?,

        Some(Commands::Desafio(cmd)) => run_desafio(&gym, cmd).await?,

        Some(Commands::Historico { limit }) => {
            let history = gym.history().await?;
            println!("Treinos realizados:");
            println!("{:-<60}", "");
            for entry in history.iter().take(limit) {
                println!(
                    "{} | {:20} | {} | +{} XP",
                    entry.date.format("%Y-%m-%d %H:%M"),
                    entry.workout_name,
                    format_elapsed(entry.elapsed_secs),
                    entry.xp,
                );
            }
        }

        Some(Commands::Stats) => {
            let user = gym.accounts.require_current().await?;
            let analytics = Analytics::new(gym.history().await?);

            println!("Estatísticas de Treino");
            println!("{:-<40}", "");
            println!("Treinos realizados: {}", analytics.workout_count());
            println!(
                "Tempo total:        {}",
                format_elapsed(analytics.total_time_secs() as u32)
            );
            println!(
                "Tempo médio:        {}",
                format_elapsed(analytics.average_time_secs())
            );
            println!(
                "Frequência:         {:.1} treinos/semana",
                analytics.weekly_frequency()
            );
            println!("XP em treinos:      {}", analytics.total_xp());
            println!("⭐ {} XP | Nível {}", user.xp, user.level());
        }

        Some(Commands::Tui) | None => {
            let mut app = App::new(gym).await?;
            tokio::task::block_in_place(|| app.run(tokio::runtime::Handle::current()))?;
        }
    }

    Ok(())
}

async fn run_treino(gym: &GymFit, cmd: TreinoCommands) -> Result<()> {
    match cmd {
        TreinoCommands::Criar {
            nome,
            descricao,
            objetivo,
            tipo,
            duracao,
            exercicios,
        } => {
            let exercises = exercicios
                .iter()
                .map(|spec| NewExercise::parse(spec))
                .collect::<Result<Vec<_>, _>>()?;
            let workout = gym
                .create_workout(NewWorkout {
                    name: nome,
                    description: descricao,
                    goal: objetivo,
                    kind: tipo,
                    duration_min: duracao,
                    exercises,
                })
                .await?;
            println!("Treino salvo com sucesso! +50 XP (id: {})", workout.id);
        }

        TreinoCommands::Listar => {
            let user = gym.accounts.require_current().await?;
            let workouts = gym.workouts.list_for_user(user.id).await?;
            if workouts.is_empty() {
                println!("Nenhum treino criado ainda. Crie seu primeiro treino!");
                return Ok(());
            }
            println!("Meus Treinos:");
            println!("{:-<60}", "");
            for workout in &workouts {
                let goal = catalog::find_goal(&workout.goal)
                    .map(|g| format!("{} {}", g.icon, g.label))
                    .unwrap_or_else(|| workout.goal.clone());
                println!(
                    "{} | {:20} | {} | ⏱️ {} min | 💪 {} exercícios",
                    workout.id,
                    workout.name,
                    goal,
                    workout
                        .duration_min
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    workout.exercises.len(),
                );
            }
        }

        TreinoCommands::Iniciar { id } => {
            let user = gym.accounts.require_current().await?;
            let workout = gym.workouts.get(user.id, id).await?;
            let mut app = App::new(gym.clone()).await?;
            app.start_workout(workout);
            tokio::task::block_in_place(|| app.run(tokio::runtime::Handle::current()))?;
        }
    }
    Ok(())
}

async fn run_desafio(gym: &GymFit, cmd: DesafioCommands) -> Result<()> {
    match cmd {
        DesafioCommands::Criar {
            nome,
            descricao,
            meta,
            tipo,
            xp,
        } => {
            let user = gym.accounts.require_current().await?;
            gym.challenges
                .create(
                    &user,
                    NewChallenge {
                        name: nome,
                        description: descricao,
                        goal: meta,
                        kind: tipo,
                        xp_reward: xp,
                    },
                )
                .await?;
            println!("Desafio criado com sucesso!");
        }

        DesafioCommands::Listar => {
            let challenges = gym.challenges.list().await?;
            if challenges.is_empty() {
                println!("Nenhum desafio criado ainda. Crie seu primeiro desafio!");
                return Ok(());
            }
            println!("Desafios:");
            println!("{:-<70}", "");
            for challenge in &challenges {
                let icon = catalog::find_challenge_kind(&challenge.kind)
                    .map(|k| k.icon)
                    .unwrap_or("✨");
                println!(
                    "{} | {icon} {:20} | {:20} | {}/{} ({}%) | ⭐ {} XP | por {}",
                    challenge.id,
                    challenge.name,
                    challenge.status.label(),
                    challenge.progress,
                    challenge.effective_goal(),
                    challenge.percent(),
                    challenge.xp_reward,
                    challenge.creator_name,
                );
            }
        }

        DesafioCommands::Iniciar { id } => {
            let user = gym.accounts.require_current().await?;
            let challenge = gym.challenges.join(user.id, id).await?;
            println!("Desafio iniciado: {}", challenge.name);
        }

        DesafioCommands::Marcar { desafio, treino } => {
            match gym.challenges.toggle_workout(desafio, treino).await? {
                MarkOutcome::GoalReached { .. } => {
                    println!("Meta atingida! Você pode concluir o desafio agora!");
                }
                MarkOutcome::Marked { progress, goal } => {
                    println!("Treino marcado! {progress}/{goal}");
                }
                MarkOutcome::Unmarked { .. } => println!("Treino desmarcado"),
            }
        }

        DesafioCommands::Concluir { id } => {
            let challenge = gym.complete_challenge(id).await?;
            println!("Desafio concluído! +{} XP", challenge.xp_reward);
        }
    }
    Ok(())
}
