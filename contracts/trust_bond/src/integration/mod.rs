mod test_trust_lifecycle;
