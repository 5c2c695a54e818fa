#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::error::Error;
    use reqwest::StatusCode;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use teloxide::types::{InlineKeyboardButtonKind, InlineKeyboardMarkup, MessageId};
    use tempfile::NamedTempFile;
    use timed_quiz_bot::*;
    use tokio::sync::Mutex;

    // Helper function to create a test question
    fn create_test_question(difficulty: Difficulty) -> Question {
        Question::new(
            "What is the capital of France?",
            vec![
                "Paris".to_string(),
                "London".to_string(),
                "Berlin".to_string(),
                "Madrid".to_string(),
            ],
            "Paris",
            difficulty,
        )
    }

    fn create_test_snapshot() -> ActiveSnapshot {
        let session = QuizSession::new(
            vec![
                create_test_question(Difficulty::Simple),
                create_test_question(Difficulty::Moderate),
            ],
            DifficultyPolicy::standard(),
        )
        .unwrap();
        match session.snapshot() {
            SessionSnapshot::Active(snapshot) => snapshot,
            SessionSnapshot::Ended(_) => unreachable!(),
        }
    }

    // Helper function to create a temporary CSV question bank
    fn create_test_csv() -> Result<NamedTempFile, Box<dyn Error>> {
        let mut temp_file = NamedTempFile::new()?;

        writeln!(
            temp_file,
            "topic,question,option1,option2,option3,option4,answer,difficulty"
        )?;
        writeln!(
            temp_file,
            "Space,Which planet is closest to the Sun?,Mercury,Venus,Earth,Mars,Mercury,Simple"
        )?;
        writeln!(
            temp_file,
            "Space,What is a light-year a unit of?,Distance,Time,Speed,Mass,Distance,Difficult"
        )?;
        writeln!(
            temp_file,
            "Space,Which planet has the Great Red Spot?,Saturn,Jupiter,Neptune,Mars,Jupiter,Moderate"
        )?;
        writeln!(
            temp_file,
            "Space,What is the closest star to Earth?,Sirius,Vega,The Sun,Polaris,The Sun,Simple"
        )?;
        writeln!(
            temp_file,
            "Geography,What is the capital of France?,Paris,London,Berlin,Madrid,Paris,Simple"
        )?;

        Ok(temp_file)
    }

    struct FixedProvider(Vec<Question>);

    #[async_trait]
    impl QuestionProvider for FixedProvider {
        async fn generate(&self, _topic: &str) -> Result<Vec<Question>, ProviderError> {
            Ok(self.0.clone())
        }

        fn source_name(&self) -> &'static str {
            "fixed"
        }
    }

    // Stands in for a question service that answers with an error status.
    #[derive(Default)]
    struct FailingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuestionProvider for FailingProvider {
        async fn generate(&self, _topic: &str) -> Result<Vec<Question>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Status {
                code: 503,
                detail: "model overloaded".to_string(),
            })
        }

        fn source_name(&self) -> &'static str {
            "failing"
        }
    }

    fn is_sorted(questions: &[Question]) -> bool {
        questions
            .windows(2)
            .all(|pair| pair[0].difficulty.rank() <= pair[1].difficulty.rank())
    }

    #[test]
    fn test_question_validation() {
        let question = create_test_question(Difficulty::Simple);
        assert!(question.validate().is_ok());
        assert!(question.has_option("Berlin"));
        assert!(!question.has_option("Rome"));
        assert!(question.is_correct(Some("Paris")));
        assert!(!question.is_correct(None));

        let mut duplicate = question.clone();
        duplicate.options[1] = "Paris".to_string();
        assert_eq!(
            duplicate.validate(),
            Err(QuestionError::DuplicateOption("Paris".to_string()))
        );

        let empty = Question::new("?", vec![], "Paris", Difficulty::Simple);
        assert_eq!(empty.validate(), Err(QuestionError::NoOptions));
    }

    #[test]
    fn test_question_wire_format() {
        let json = r#"[{"question":"2+2?","options":["3","4"],"answer":"4","difficulty":"Moderate"}]"#;
        let questions: Vec<Question> = serde_json::from_str(json).unwrap();

        assert_eq!(questions[0].prompt, "2+2?");
        assert_eq!(questions[0].correct_answer, "4");
        assert_eq!(questions[0].difficulty, Difficulty::Moderate);
    }

    #[test]
    fn test_sort_by_difficulty_is_stable() {
        let mut first = create_test_question(Difficulty::Simple);
        first.prompt = "first simple".to_string();
        let mut second = create_test_question(Difficulty::Simple);
        second.prompt = "second simple".to_string();
        let hard = create_test_question(Difficulty::Difficult);
        let medium = create_test_question(Difficulty::Moderate);

        let sorted = sort_by_difficulty(vec![hard, first, medium, second]);

        let order: Vec<(Difficulty, &str)> = sorted
            .iter()
            .map(|q| (q.difficulty, q.prompt.as_str()))
            .collect();
        assert_eq!(order[0], (Difficulty::Simple, "first simple"));
        assert_eq!(order[1], (Difficulty::Simple, "second simple"));
        assert_eq!(order[2].0, Difficulty::Moderate);
        assert_eq!(order[3].0, Difficulty::Difficult);
        assert!(is_sorted(&sorted));
    }

    #[test]
    fn test_difficulty_policy() {
        let policy = DifficultyPolicy::standard();
        assert_eq!(policy, DifficultyPolicy::new(&STANDARD_TIERS).unwrap());
        assert_eq!(policy.tier(Difficulty::Simple), TierConfig { allotted_seconds: 10, points: 1 });
        assert_eq!(policy.allotted_seconds(Difficulty::Moderate), 20);
        assert_eq!(policy.points(Difficulty::Difficult), 3);
        assert_eq!(Curriculum::STANDARD.max_score(&policy), 30);
        assert_eq!(Curriculum::STANDARD.count(Difficulty::Moderate), 5);
    }

    #[test]
    fn test_difficulty_policy_rejects_incomplete_table() {
        let partial = [STANDARD_TIERS[0], STANDARD_TIERS[1]];
        assert!(matches!(
            DifficultyPolicy::new(&partial),
            Err(ConfigError::MissingTier(Difficulty::Difficult))
        ));

        let repeated = [STANDARD_TIERS[0], STANDARD_TIERS[0], STANDARD_TIERS[2]];
        assert!(matches!(
            DifficultyPolicy::new(&repeated),
            Err(ConfigError::DuplicateTier(Difficulty::Simple))
        ));

        let zero = [
            STANDARD_TIERS[0],
            (Difficulty::Moderate, TierConfig { allotted_seconds: 0, points: 2 }),
            STANDARD_TIERS[2],
        ];
        assert!(matches!(
            DifficultyPolicy::new(&zero),
            Err(ConfigError::NonPositiveTier(Difficulty::Moderate))
        ));
    }

    #[test]
    fn test_results_summary() {
        let result = QuizResult {
            final_score: 6,
            final_overall_remaining: 270,
            reason: EndReason::Completed,
        };
        let summary = ResultsSummary::new(result, 30);

        assert_eq!(summary.accuracy_percent, 20);
        assert_eq!(summary.time_remaining, 270);
        assert_eq!(accuracy_percent(2, 3), 67);
        assert_eq!(accuracy_percent(5, 0), 0);
        assert_eq!(format_duration(270), "4m 30s");
        assert_eq!(format_clock(65), "01:05");

        let text = render_results(&summary);
        assert!(text.contains("6 / 30"));
        assert!(text.contains("20%"));
        assert!(text.contains("4m 30s"));
    }

    #[test]
    fn test_render_question() {
        let snapshot = create_test_snapshot();
        let text = render_question(&snapshot);

        assert!(text.contains("Question 1 of 2"));
        assert!(text.contains("05:00"));
        assert!(text.contains("What is the capital of France?"));
        assert_eq!(timer_bar(&snapshot), "🟩".repeat(10));
    }

    #[test]
    fn test_should_refresh_once_per_fifth_second() {
        let mut snapshot = create_test_snapshot();
        snapshot.overall_remaining = 295;

        assert!(should_refresh(TickSource::Overall, &snapshot));
        assert!(!should_refresh(TickSource::Question, &snapshot));

        snapshot.overall_remaining = 294;
        assert!(!should_refresh(TickSource::Overall, &snapshot));
    }

    #[test]
    fn test_message_gate_keeps_results_on_screen() {
        let mut gate = MessageGate::default();
        let first = create_test_snapshot();
        let mut second = create_test_snapshot();
        second.epoch = 1;
        second.index = 1;

        assert!(gate.admit_question(&first));
        assert!(gate.admit_question(&second));
        // A late redraw of the previous question is dropped.
        assert!(!gate.admit_question(&first));
        assert!(gate.admit_question(&second));

        assert!(gate.admit_close());
        assert!(gate.is_closed());
        assert!(!gate.admit_question(&second));
        assert!(!gate.admit_close());
    }

    #[test]
    fn test_create_keyboard_initial() {
        let snapshot = create_test_snapshot();
        let InlineKeyboardMarkup { inline_keyboard } = create_keyboard(&snapshot);

        // 4 options + Next/End row
        assert_eq!(inline_keyboard.len(), 5);
        for row in &inline_keyboard[..4] {
            assert_eq!(row.len(), 1);
            assert!(!row[0].text.contains("👉"));
        }
        let controls = &inline_keyboard[4];
        assert!(controls[0].text.contains("Next"));
        assert!(controls[1].text.contains("🛑"));
        assert_eq!(
            controls[0].kind,
            InlineKeyboardButtonKind::CallbackData("next:0".to_string())
        );
    }

    #[test]
    fn test_create_keyboard_marks_selection() {
        let mut snapshot = create_test_snapshot();
        snapshot.selected_answer = Some("London".to_string());
        snapshot.index = 1;

        let InlineKeyboardMarkup { inline_keyboard } = create_keyboard(&snapshot);

        assert!(inline_keyboard[1][0].text.starts_with("👉"));
        assert!(!inline_keyboard[0][0].text.starts_with("👉"));
        assert!(inline_keyboard[4][0].text.contains("Finish"));
    }

    #[test]
    fn test_quiz_action_callback_data() {
        let select = QuizAction::Select { epoch: 3, index: 2 };
        assert_eq!(select.callback_data(), "opt:3:2");
        assert_eq!(QuizAction::parse("opt:3:2"), Some(select));
        assert_eq!(QuizAction::parse("next:4"), Some(QuizAction::Next { epoch: 4 }));
        assert_eq!(QuizAction::parse("end_quiz"), Some(QuizAction::End));
        assert_eq!(QuizAction::parse("opt:x"), None);
        assert_eq!(QuizAction::parse("Paris"), None);
    }

    #[tokio::test]
    async fn test_csv_provider_filters_by_topic() -> Result<(), Box<dyn Error>> {
        let file = create_test_csv()?;
        let provider = CsvQuestionProvider::from_path(file.path())?.with_rng(StdRng::seed_from_u64(7));
        assert_eq!(provider.len(), 5);

        let questions = provider.generate("space").await?;
        assert_eq!(questions.len(), 4);
        assert!(questions.iter().all(|q| q.validate().is_ok()));

        let geography = provider.generate("GEOGRAPHY").await?;
        assert_eq!(geography.len(), 1);
        assert_eq!(geography[0].correct_answer, "Paris");

        assert!(matches!(
            provider.generate("cooking").await,
            Err(ProviderError::NoQuestions(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_csv_provider_respects_curriculum() -> Result<(), Box<dyn Error>> {
        let file = create_test_csv()?;
        let provider = CsvQuestionProvider::from_path(file.path())?.with_curriculum(Curriculum {
            simple: 1,
            moderate: 0,
            difficult: 1,
        });

        let questions = provider.generate("Space").await?;

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].difficulty, Difficulty::Simple);
        assert_eq!(questions[1].difficulty, Difficulty::Difficult);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_quiz_sorts_and_validates() {
        let provider = FixedProvider(vec![
            create_test_question(Difficulty::Difficult),
            create_test_question(Difficulty::Simple),
        ]);
        let questions = fetch_quiz(&provider, "anything").await.unwrap();
        assert!(is_sorted(&questions));

        let mut broken = create_test_question(Difficulty::Simple);
        broken.correct_answer = "Rome".to_string();
        let provider = FixedProvider(vec![create_test_question(Difficulty::Simple), broken]);
        assert!(matches!(
            fetch_quiz(&provider, "anything").await,
            Err(ProviderError::InvalidQuestion { index: 1, .. })
        ));

        let provider = FixedProvider(vec![]);
        assert!(matches!(
            fetch_quiz(&provider, "anything").await,
            Err(ProviderError::NoQuestions(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_quiz_passes_provider_error_through() {
        let provider = FailingProvider::default();

        match fetch_quiz(&provider, "black holes").await {
            Err(ProviderError::Status { code, detail }) => {
                assert_eq!(code, 503);
                assert_eq!(detail, "model overloaded");
            }
            other => panic!("expected status error, got {:?}", other),
        }
        // No retry.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_parse_response_errors() {
        match parse_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail":"quota exceeded"}"#) {
            Err(ProviderError::Status { code, detail }) => {
                assert_eq!(code, 500);
                assert_eq!(detail, "quota exceeded");
            }
            other => panic!("expected status error, got {:?}", other),
        }
        assert!(matches!(
            parse_response(StatusCode::BAD_GATEWAY, "<html>"),
            Err(ProviderError::Status { code: 502, ref detail }) if detail == "Failed to fetch quiz questions"
        ));
        assert!(matches!(
            parse_response(StatusCode::OK, "not json"),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_response_repairs_answers() {
        let body = r#"[{"question":"2+2?","options":["3","5"],"answer":"4","difficulty":"Simple"}]"#;
        let questions = parse_response(StatusCode::OK, body).unwrap();

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options, vec!["4".to_string(), "5".to_string()]);
        assert!(questions[0].validate().is_ok());
    }

    #[test]
    fn test_repair_answer_and_error_detail() {
        let mut question = create_test_question(Difficulty::Simple);
        question.correct_answer = "Rome".to_string();

        let repaired = repair_answer(question);
        assert_eq!(repaired.options[0], "Rome");
        assert!(repaired.validate().is_ok());

        assert_eq!(error_detail(r#"{"detail":"quota exceeded"}"#), "quota exceeded");
        assert_eq!(error_detail("<html>"), "Failed to fetch quiz questions");
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("QUIZ_QUESTIONS_CSV", "bank.csv"),
            ("QUIZ_OVERALL_SECONDS", "120"),
        ]);
        let config = Config::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();

        assert_eq!(
            config.provider,
            ProviderSource::Csv {
                path: "bank.csv".into()
            }
        );
        assert_eq!(config.overall_seconds, 120);
        assert_eq!(config.total_marks, 30);

        let defaults = Config::from_lookup(|_| None).unwrap();
        assert_eq!(defaults.overall_seconds, 300);
        assert!(matches!(defaults.provider, ProviderSource::Http { ref url, .. } if url == DEFAULT_PROVIDER_URL));

        assert!(matches!(
            Config::from_lookup(|name| (name == "QUIZ_TOTAL_MARKS").then(|| "lots".to_string())),
            Err(ConfigError::InvalidVar { name: "QUIZ_TOTAL_MARKS", .. })
        ));
        assert!(Config::from_lookup(|name| (name == "QUIZ_OVERALL_SECONDS").then(|| "0".to_string())).is_err());
    }

    // Test BotState bookkeeping
    #[tokio::test]
    async fn test_bot_state_replaces_and_finishes_quizzes() {
        let provider = Arc::new(FixedProvider(vec![create_test_question(Difficulty::Simple)]));
        let state = BotState::new(provider, Config::default());
        let chat_id = 12345i64;

        let new_quiz = |message_id: i32| {
            let session = QuizSession::new(
                vec![create_test_question(Difficulty::Simple)],
                DifficultyPolicy::standard(),
            )
            .unwrap();
            ActiveQuiz {
                topic: "Geography".to_string(),
                message_id: MessageId(message_id),
                started_at: chrono::Utc::now(),
                clock: SessionClock::start(session, Arc::new(NoopObserver)),
                gate: Arc::new(Mutex::new(MessageGate::default())),
            }
        };

        assert!(state.insert_quiz(chat_id, new_quiz(1)).await.is_none());
        let replaced = state.insert_quiz(chat_id, new_quiz(2)).await;
        assert_eq!(replaced.map(|q| q.message_id), Some(MessageId(1)));

        // A press on the replaced quiz's message leaves the new quiz alone.
        assert!(state.finish_quiz(chat_id, MessageId(1)).await.is_none());
        assert!(state.active_quiz(chat_id).await.is_some());

        assert!(state.finish_quiz(chat_id, MessageId(2)).await.is_some());
        assert!(state.active_quiz(chat_id).await.is_none());
    }

    struct NoopObserver;

    #[async_trait]
    impl SessionObserver for NoopObserver {
        async fn on_transition(
            &self,
            _source: TickSource,
            _transition: Transition,
            _snapshot: SessionSnapshot,
        ) {
        }
    }
}
