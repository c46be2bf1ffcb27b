#[cfg(test)]
mod github_client_tests {
    use hubgate_platform::*;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, owner: Option<&str>) -> GithubClient {
        let mut config = GithubConfig::new("t0ken");
        config.api_url = server.uri();
        config.owner = owner.map(str::to_string);
        GithubClient::new(config).unwrap()
    }

    fn issue(number: u64) -> serde_json::Value {
        json!({
            "number": number,
            "title": format!("Issue {number}"),
            "state": "open",
            "html_url": format!("https://github.test/octo/r/issues/{number}"),
            "user": {"login": "alice"},
            "created_at": "2024-01-02T03:04:05Z"
        })
    }

    #[tokio::test]
    async fn test_list_issues_follows_link_header() {
        let server = MockServer::start().await;
        let next = format!(
            "<{}/repos/octo/r/issues?state=all&per_page=2&page=2>; rel=\"next\"",
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/repos/octo/r/issues"))
            .and(query_param("page", "1"))
            .and(query_param("state", "all"))
            .and(header("authorization", "Bearer t0ken"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([issue(1), issue(2)]))
                    .insert_header("link", next.as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/r/issues"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue(3)])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, None);
        let repo = RepoRef::parse("octo/r").unwrap();
        let filter = IssueFilter {
            state: ItemState::All,
            since: None,
        };
        let cancel = CancellationToken::new();
        let issues = collect_all(&cancel, PageCursor::first(2), |cursor| {
            client.list_issues(&repo, &filter, cursor)
        })
        .await
        .unwrap();

        let numbers: Vec<u64> = issues.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_not_found_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/missing/issues/9"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&server)
            .await;

        let client = client(&server, Some("octo"));
        let err = client
            .get_issue(&RepoRef::parse("missing").unwrap(), 9)
            .await
            .unwrap_err();
        match err {
            PlatformError::NotFound(message) => assert_eq!(message, "Not Found"),
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exhausted_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/r"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-reset", "1700000000")
                    .set_body_json(json!({"message": "API rate limit exceeded"})),
            )
            .mount(&server)
            .await;

        let client = client(&server, None);
        let err = client
            .get_repository(&RepoRef::parse("octo/r").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PlatformError::RateLimited {
                status: 403,
                reset_at: Some(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_bare_name_resolves_authenticated_user_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "me"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/me/tool/branches/main"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"name": "main", "commit": {"sha": "0123456789abcdef"}})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server, None);
        let repo = RepoRef::parse("tool").unwrap();
        let first = client.get_branch(&repo, "main").await.unwrap();
        let second = client.get_branch(&repo, "main").await.unwrap();
        assert_eq!(first.commit.sha, "0123456789abcdef");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_close_issue_patches_state() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/octo/r/issues/4"))
            .respond_with(ResponseTemplate::new(200).set_body_json({
                let mut closed = issue(4);
                closed["state"] = json!("closed");
                closed
            }))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, Some("octo"));
        let issue = client
            .set_issue_state(&RepoRef::parse("r").unwrap(), 4, ItemState::Closed)
            .await
            .unwrap();
        assert_eq!(issue.state, "closed");
    }
}
