//! Integration tests for the full workflow engine over the in-memory store.
//!
//! Tests: controller → store transaction → row lock → mutation → notification.
//!
//! Verifies:
//! - At most one certificate per application under concurrent triggers
//! - Idempotent payment confirmation (`paid → paid`)
//! - Monotonic application status (no path back to draft)
//! - Unique code generation under load
//! - Precondition and illegal-transition guards leave state untouched

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use certportal_applications::{
        Application, ApplicationId, ApplicationStatus, ApplicationType, ApproveApplication,
        AuditAction, CreateApplication, DocumentType, QualificationTier, RejectApplication,
        StartReview, SubmitApplication,
    };
    use certportal_auth::{Principal, Role};
    use certportal_billing::{
        CreateInvoice, Transaction, TransactionId, TransactionStatus, UpdateTransactionStatus,
    };
    use certportal_certificates::{Certificate, CertificateId, CertificateStatus};
    use certportal_core::{CodeKind, CompanyId, Precondition, RecordId, UserId, WorkflowError};
    use chrono::Utc;

    use crate::collaborators::{InMemoryDocumentStore, InMemoryIdentityDirectory};
    use crate::engine::{codes, BillingController, IssuanceService, LifecycleController};
    use crate::store::{InMemoryWorkflowStore, WorkflowStore};

    struct Harness {
        store: Arc<InMemoryWorkflowStore>,
        documents: Arc<InMemoryDocumentStore>,
        identity: Arc<InMemoryIdentityDirectory>,
        lifecycle: Arc<LifecycleController>,
        billing: Arc<BillingController>,
        admin: Principal,
        applicant: Principal,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryWorkflowStore::new());
        let documents = Arc::new(InMemoryDocumentStore::new());
        let identity = Arc::new(InMemoryIdentityDirectory::new());

        let admin = Principal::new(UserId::new(), Role::Admin);
        let applicant = Principal::new(UserId::new(), Role::Applicant);
        identity.register_admin(admin.user_id);
        identity.register_verified(applicant.user_id);

        let issuance = IssuanceService::default();
        let lifecycle = Arc::new(LifecycleController::new(
            store.clone(),
            documents.clone(),
            identity.clone(),
            issuance.clone(),
        ));
        let billing = Arc::new(BillingController::new(store.clone(), issuance));

        Harness {
            store,
            documents,
            identity,
            lifecycle,
            billing,
            admin,
            applicant,
        }
    }

    fn create_request() -> CreateApplication {
        CreateApplication {
            company_id: CompanyId::new(),
            application_type: ApplicationType::New,
            classification: "building construction".to_string(),
            business_field: "BG001".to_string(),
            qualification: QualificationTier::Medium,
        }
    }

    async fn draft(h: &Harness) -> Application {
        h.lifecycle
            .create(&h.applicant, create_request())
            .await
            .expect("create draft")
    }

    async fn submitted(h: &Harness) -> Application {
        let app = draft(h).await;
        h.documents.attach_all(app.id, &DocumentType::ALL);
        h.lifecycle
            .submit(&h.applicant, SubmitApplication { application_id: app.id })
            .await
            .expect("submit")
    }

    #[tokio::test]
    async fn create_assigns_application_number_and_audit_entry() {
        let h = harness();
        let app = draft(&h).await;
        assert!(app.application_number.starts_with("SBU-"));
        assert_eq!(app.status, ApplicationStatus::Draft);

        let audit = h.store.audit_entries(app.id).await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, AuditAction::Created);
    }

    #[tokio::test]
    async fn submit_blocked_by_missing_documents() {
        let h = harness();
        let app = draft(&h).await;
        h.documents.attach(app.id, DocumentType::BusinessLicense);
        h.documents.attach(app.id, DocumentType::TaxRegistration);
        h.documents
            .attach(app.id, DocumentType::DeedOfEstablishment);

        let err = h
            .lifecycle
            .submit(&h.applicant, SubmitApplication { application_id: app.id })
            .await
            .unwrap_err();
        match err {
            WorkflowError::Precondition(Precondition::MissingDocuments { document_types }) => {
                assert_eq!(document_types, vec!["financial_statement".to_string()]);
            }
            other => panic!("expected MissingDocuments, got {other:?}"),
        }

        // No partial state change.
        let stored = h.store.application(app.id).await.unwrap();
        assert_eq!(stored.status, ApplicationStatus::Draft);
        assert!(stored.submitted_at.is_none());
    }

    #[tokio::test]
    async fn submit_notifies_every_administrator() {
        let h = harness();
        let second_admin = UserId::new();
        h.identity.register_admin(second_admin);

        let app = submitted(&h).await;
        assert_eq!(app.status, ApplicationStatus::Submitted);

        let notifications = h.store.notifications().await;
        let recipients: HashSet<_> = notifications.iter().map(|n| n.user_id).collect();
        assert!(recipients.contains(&h.admin.user_id));
        assert!(recipients.contains(&second_admin));
    }

    #[tokio::test]
    async fn submit_requires_ownership() {
        let h = harness();
        let app = draft(&h).await;
        h.documents.attach_all(app.id, &DocumentType::ALL);

        let stranger = Principal::new(UserId::new(), Role::Applicant);
        let err = h
            .lifecycle
            .submit(&stranger, SubmitApplication { application_id: app.id })
            .await
            .unwrap_err();
        // Ownership failures read as not-found to avoid leaking existence.
        assert_eq!(err, WorkflowError::NotFound);
    }

    #[tokio::test]
    async fn approve_issues_certificate_and_completes() {
        let h = harness();
        let app = submitted(&h).await;
        h.lifecycle
            .start_review(&h.admin, StartReview { application_id: app.id })
            .await
            .unwrap();

        let approved = h
            .lifecycle
            .approve(&h.admin, ApproveApplication { application_id: app.id })
            .await
            .unwrap();
        assert_eq!(approved.status, ApplicationStatus::Completed);
        assert_eq!(approved.reviewer_id, Some(h.admin.user_id));
        assert!(approved.completed_at.is_some());

        let certs = h.store.certificates_for(app.id).await;
        assert_eq!(certs.len(), 1);
        let cert = &certs[0];
        assert!(cert.certificate_number.starts_with("SBU-KI-"));
        assert!(cert
            .national_registration_number
            .as_deref()
            .unwrap()
            .starts_with("NRN-"));
        assert_eq!(cert.classification, app.classification);
        assert_eq!(cert.qualification, app.qualification);
    }

    #[tokio::test]
    async fn approve_requires_admin_privilege() {
        let h = harness();
        let app = submitted(&h).await;
        let err = h
            .lifecycle
            .approve(&h.applicant, ApproveApplication { application_id: app.id })
            .await
            .unwrap_err();
        assert_eq!(err, WorkflowError::Unauthorized);
    }

    #[tokio::test]
    async fn approve_blocked_when_owner_not_verified() {
        let h = harness();
        let unverified = Principal::new(UserId::new(), Role::Applicant);
        let app = h
            .lifecycle
            .create(&unverified, create_request())
            .await
            .unwrap();
        h.documents.attach_all(app.id, &DocumentType::ALL);
        h.lifecycle
            .submit(&unverified, SubmitApplication { application_id: app.id })
            .await
            .unwrap();

        let err = h
            .lifecycle
            .approve(&h.admin, ApproveApplication { application_id: app.id })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Precondition(Precondition::OwnerNotVerified)
        );
        assert!(h.store.certificates_for(app.id).await.is_empty());
    }

    #[tokio::test]
    async fn reject_completed_application_changes_nothing() {
        let h = harness();
        let app = submitted(&h).await;
        h.lifecycle
            .approve(&h.admin, ApproveApplication { application_id: app.id })
            .await
            .unwrap();
        let audit_before = h.store.audit_entries(app.id).await.len();

        let err = h
            .lifecycle
            .reject(
                &h.admin,
                RejectApplication {
                    application_id: app.id,
                    reason: "documents are inconsistent with the registry".to_string(),
                },
            )
            .await
            .unwrap_err();
        match err {
            WorkflowError::IllegalTransition { current, requested } => {
                assert_eq!(current, "completed");
                assert_eq!(requested, "rejected");
            }
            other => panic!("expected IllegalTransition, got {other:?}"),
        }

        let stored = h.store.application(app.id).await.unwrap();
        assert_eq!(stored.status, ApplicationStatus::Completed);
        assert_eq!(h.store.certificates_for(app.id).await.len(), 1);
        assert_eq!(h.store.audit_entries(app.id).await.len(), audit_before);
    }

    #[tokio::test]
    async fn reject_records_reason_in_audit_log() {
        let h = harness();
        let app = submitted(&h).await;
        let reason = "business license has expired".to_string();
        let rejected = h
            .lifecycle
            .reject(
                &h.admin,
                RejectApplication {
                    application_id: app.id,
                    reason: reason.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(rejected.status, ApplicationStatus::Rejected);
        assert_eq!(rejected.reviewer_id, Some(h.admin.user_id));

        let audit = h.store.audit_entries(app.id).await;
        let entry = audit
            .iter()
            .find(|e| e.action == AuditAction::Rejected)
            .expect("rejection audit entry");
        assert_eq!(entry.detail.as_deref(), Some(reason.as_str()));

        let owner_note = h
            .store
            .notifications()
            .await
            .into_iter()
            .find(|n| n.user_id == app.owner_id && n.title == "Application rejected")
            .expect("owner notified");
        assert!(owner_note.message.contains(&reason));
    }

    #[tokio::test]
    async fn reject_requires_a_substantial_reason() {
        let h = harness();
        let app = submitted(&h).await;
        let err = h
            .lifecycle
            .reject(
                &h.admin,
                RejectApplication {
                    application_id: app.id,
                    reason: "bad".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        // Validation fires before any lock; nothing changed.
        let stored = h.store.application(app.id).await.unwrap();
        assert_eq!(stored.status, ApplicationStatus::Submitted);
    }

    #[tokio::test]
    async fn invoice_then_payment_issues_certificate_once() {
        let h = harness();
        let app = submitted(&h).await;
        let txn = h
            .billing
            .create_invoice(
                &h.admin,
                CreateInvoice {
                    application_id: app.id,
                    amount: 1_500_000,
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert!(txn.transaction_number.starts_with("TRX-"));
        assert_eq!(txn.status, TransactionStatus::Pending);

        let (paid, cert) = h
            .billing
            .update_status(
                &h.admin,
                UpdateTransactionStatus {
                    transaction_id: txn.id,
                    status: TransactionStatus::Paid,
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(paid.status, TransactionStatus::Paid);
        assert!(paid.paid_at.is_some());
        assert!(cert.is_some());

        let stored = h.store.application(app.id).await.unwrap();
        assert_eq!(stored.status, ApplicationStatus::Completed);

        // Webhook retry: succeeds, issues nothing further.
        let (retried, cert_again) = h
            .billing
            .update_status(
                &h.admin,
                UpdateTransactionStatus {
                    transaction_id: txn.id,
                    status: TransactionStatus::Paid,
                    notes: Some("retry".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(retried.status, TransactionStatus::Paid);
        assert!(cert_again.is_none());
        assert_eq!(h.store.certificates_for(app.id).await.len(), 1);
    }

    #[tokio::test]
    async fn second_open_invoice_is_blocked() {
        let h = harness();
        let app = submitted(&h).await;
        let req = CreateInvoice {
            application_id: app.id,
            amount: 1_000_000,
            notes: None,
        };
        h.billing.create_invoice(&h.admin, req.clone()).await.unwrap();
        let err = h.billing.create_invoice(&h.admin, req).await.unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Precondition(Precondition::InvoiceAlreadyOpen)
        );
    }

    #[tokio::test]
    async fn invoice_requires_billable_status() {
        let h = harness();
        let app = draft(&h).await;
        let err = h
            .billing
            .create_invoice(
                &h.admin,
                CreateInvoice {
                    application_id: app.id,
                    amount: 1_000_000,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::IllegalTransition { .. }));
    }

    #[tokio::test]
    async fn cancelled_transaction_refuses_payment() {
        let h = harness();
        let app = submitted(&h).await;
        let txn = h
            .billing
            .create_invoice(
                &h.admin,
                CreateInvoice {
                    application_id: app.id,
                    amount: 500_000,
                    notes: None,
                },
            )
            .await
            .unwrap();
        h.billing
            .update_status(
                &h.admin,
                UpdateTransactionStatus {
                    transaction_id: txn.id,
                    status: TransactionStatus::Cancelled,
                    notes: None,
                },
            )
            .await
            .unwrap();

        let err = h
            .billing
            .update_status(
                &h.admin,
                UpdateTransactionStatus {
                    transaction_id: txn.id,
                    status: TransactionStatus::Paid,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::IllegalTransition { .. }));
        assert!(h.store.certificates_for(app.id).await.is_empty());
    }

    #[tokio::test]
    async fn payment_for_rejected_application_records_but_does_not_issue() {
        let h = harness();
        let app = submitted(&h).await;
        let txn = h
            .billing
            .create_invoice(
                &h.admin,
                CreateInvoice {
                    application_id: app.id,
                    amount: 750_000,
                    notes: None,
                },
            )
            .await
            .unwrap();
        h.lifecycle
            .reject(
                &h.admin,
                RejectApplication {
                    application_id: app.id,
                    reason: "qualification tier not supported by evidence".to_string(),
                },
            )
            .await
            .unwrap();

        let (paid, cert) = h
            .billing
            .update_status(
                &h.admin,
                UpdateTransactionStatus {
                    transaction_id: txn.id,
                    status: TransactionStatus::Paid,
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(paid.status, TransactionStatus::Paid);
        assert!(cert.is_none());
        let stored = h.store.application(app.id).await.unwrap();
        assert_eq!(stored.status, ApplicationStatus::Rejected);
        assert!(h.store.certificates_for(app.id).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_approve_and_paid_issue_exactly_one_certificate() {
        let h = harness();
        let app = submitted(&h).await;
        h.lifecycle
            .start_review(&h.admin, StartReview { application_id: app.id })
            .await
            .unwrap();
        let txn = h
            .billing
            .create_invoice(
                &h.admin,
                CreateInvoice {
                    application_id: app.id,
                    amount: 2_000_000,
                    notes: None,
                },
            )
            .await
            .unwrap();

        let lifecycle = h.lifecycle.clone();
        let billing = h.billing.clone();
        let admin = h.admin;
        let approve = tokio::spawn(async move {
            lifecycle
                .approve(&admin, ApproveApplication { application_id: app.id })
                .await
        });
        let pay = tokio::spawn(async move {
            billing
                .update_status(
                    &admin,
                    UpdateTransactionStatus {
                        transaction_id: txn.id,
                        status: TransactionStatus::Paid,
                        notes: None,
                    },
                )
                .await
        });

        approve.await.unwrap().expect("approve succeeds");
        pay.await.unwrap().expect("payment succeeds");

        let stored = h.store.application(app.id).await.unwrap();
        assert_eq!(stored.status, ApplicationStatus::Completed);
        assert_eq!(h.store.certificates_for(app.id).await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_double_paid_issues_exactly_one_certificate() {
        let h = harness();
        let app = submitted(&h).await;
        let txn = h
            .billing
            .create_invoice(
                &h.admin,
                CreateInvoice {
                    application_id: app.id,
                    amount: 2_000_000,
                    notes: None,
                },
            )
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..2 {
            let billing = h.billing.clone();
            let admin = h.admin;
            handles.push(tokio::spawn(async move {
                billing
                    .update_status(
                        &admin,
                        UpdateTransactionStatus {
                            transaction_id: txn.id,
                            status: TransactionStatus::Paid,
                            notes: None,
                        },
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().expect("paid confirmation succeeds");
        }

        assert_eq!(h.store.certificates_for(app.id).await.len(), 1);
        let stored_txn = h.store.transaction(txn.id).await.unwrap();
        assert_eq!(stored_txn.status, TransactionStatus::Paid);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn application_numbers_are_unique_under_load() {
        let h = harness();
        let mut handles = Vec::new();
        for _ in 0..1000 {
            let lifecycle = h.lifecycle.clone();
            let applicant = h.applicant;
            handles.push(tokio::spawn(async move {
                lifecycle
                    .create(&applicant, create_request())
                    .await
                    .map(|a| a.application_number)
            }));
        }

        let mut numbers = HashSet::new();
        for handle in handles {
            let number = handle.await.unwrap().expect("create succeeds");
            assert!(numbers.insert(number), "duplicate application number");
        }
        assert_eq!(numbers.len(), 1000);
    }

    #[tokio::test]
    async fn narrowed_required_document_set_gates_submit() {
        let h = harness();
        let lifecycle = LifecycleController::new(
            h.store.clone(),
            h.documents.clone(),
            h.identity.clone(),
            IssuanceService::default(),
        )
        .with_required_documents(vec![DocumentType::BusinessLicense]);

        let app = lifecycle
            .create(&h.applicant, create_request())
            .await
            .unwrap();
        h.documents.attach(app.id, DocumentType::BusinessLicense);

        // The other three document types are not required by this controller.
        let submitted = lifecycle
            .submit(&h.applicant, SubmitApplication { application_id: app.id })
            .await
            .unwrap();
        assert_eq!(submitted.status, ApplicationStatus::Submitted);
    }

    #[tokio::test]
    async fn issuance_codes_are_unique_under_load() {
        let h = harness();
        let mut tx = h.store.begin().await.unwrap();

        let mut transaction_numbers = HashSet::new();
        let mut certificate_numbers = HashSet::new();
        let mut registration_numbers = HashSet::new();

        let owner = UserId::new();
        let now = Utc::now();
        for _ in 0..1000 {
            // Insert each code's row so later probes within the transaction
            // see it, exactly as the engine does before committing.
            let transaction_number = codes::generate_unique(&mut *tx, CodeKind::TransactionNumber)
                .await
                .unwrap();
            tx.insert_transaction(&Transaction::pending(
                TransactionId::new(RecordId::new()),
                owner,
                ApplicationId::new(RecordId::new()),
                transaction_number.clone(),
                1_000_000,
                None,
                now,
            ))
            .await
            .unwrap();
            assert!(
                transaction_numbers.insert(transaction_number),
                "duplicate transaction number"
            );

            let certificate_number = codes::generate_unique(&mut *tx, CodeKind::CertificateNumber)
                .await
                .unwrap();
            let registration_number =
                codes::generate_unique(&mut *tx, CodeKind::NationalRegistration)
                    .await
                    .unwrap();
            tx.insert_certificate(&Certificate {
                id: CertificateId::new(RecordId::new()),
                owner_id: owner,
                application_id: ApplicationId::new(RecordId::new()),
                certificate_number: certificate_number.clone(),
                national_registration_number: Some(registration_number.clone()),
                classification: "building construction".to_string(),
                business_field: "BG001".to_string(),
                qualification: QualificationTier::Medium,
                issued_at: now,
                expires_at: now,
                status: CertificateStatus::Active,
                issuer_name: "Construction Services Certification Body".to_string(),
                file_path: None,
            })
            .await
            .unwrap();
            assert!(
                certificate_numbers.insert(certificate_number),
                "duplicate certificate number"
            );
            assert!(
                registration_numbers.insert(registration_number),
                "duplicate national registration number"
            );
        }

        tx.rollback().await.unwrap();
        assert_eq!(transaction_numbers.len(), 1000);
        assert_eq!(certificate_numbers.len(), 1000);
        assert_eq!(registration_numbers.len(), 1000);
    }
}
